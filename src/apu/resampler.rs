//! Windowed-sinc stereo resampler: the internal 65,536 Hz mixer rate to whatever the
//! host output device actually runs at. No reference implementation was retrieved for
//! this (`common/dsp/resampler/windowed-sinc.hpp` wasn't in the pack) — authored from
//! the documented 32-tap windowed-sinc interface the reference exposes.

const TAPS: usize = 32;
const INPUT_RATE: f64 = 65_536.0;

pub struct SincResampler {
    history: [(f32, f32); TAPS],
    write_pos: usize,
    filled: usize,
    ratio: f64,
    position: f64,
}

impl SincResampler {
    pub fn new(output_rate: u32) -> Self {
        Self {
            history: [(0.0, 0.0); TAPS],
            write_pos: 0,
            filled: 0,
            ratio: INPUT_RATE / output_rate.max(1) as f64,
            position: 0.0,
        }
    }

    pub fn set_output_rate(&mut self, output_rate: u32) {
        self.ratio = INPUT_RATE / output_rate.max(1) as f64;
    }

    /// Feed one 65,536 Hz input frame into the tap history.
    pub fn push(&mut self, frame: (f32, f32)) {
        self.history[self.write_pos] = frame;
        self.write_pos = (self.write_pos + 1) % TAPS;
        self.filled = (self.filled + 1).min(TAPS);
        self.position -= 1.0;
    }

    /// Whether enough input has accumulated to convolve the next output frame.
    pub fn ready(&self) -> bool {
        self.filled == TAPS && self.position <= 0.0
    }

    /// Convolve the tap history against a Hann-windowed sinc kernel centered on the
    /// current fractional read position, then advance toward the next output frame.
    pub fn pop(&mut self) -> (f32, f32) {
        let center = TAPS as f64 / 2.0 + self.position;
        let mut left = 0.0f64;
        let mut right = 0.0f64;
        let mut weight_sum = 0.0f64;
        for i in 0..TAPS {
            let x = i as f64 - center;
            let w = sinc(x) * hann(x, TAPS as f64);
            let idx = (self.write_pos + i) % TAPS;
            left += self.history[idx].0 as f64 * w;
            right += self.history[idx].1 as f64 * w;
            weight_sum += w;
        }
        if weight_sum.abs() > 1e-9 {
            left /= weight_sum;
            right /= weight_sum;
        }
        self.position += self.ratio;
        (left as f32, right as f32)
    }
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-9 {
        1.0
    } else {
        (std::f64::consts::PI * x).sin() / (std::f64::consts::PI * x)
    }
}

fn hann(x: f64, width: f64) -> f64 {
    let t = (x / width + 0.5).clamp(0.0, 1.0);
    0.5 - 0.5 * (2.0 * std::f64::consts::PI * t).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_input_converges_to_the_same_constant() {
        let mut resampler = SincResampler::new(65_536);
        for _ in 0..TAPS * 4 {
            resampler.push((0.5, -0.5));
            if resampler.ready() {
                let (l, r) = resampler.pop();
                assert!((l - 0.5).abs() < 0.05);
                assert!((r + 0.5).abs() < 0.05);
            }
        }
    }
}
