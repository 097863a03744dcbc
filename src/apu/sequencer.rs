//! Shared envelope/sweep/length state clocked by the APU's 512 Hz frame sequencer.
//!
//! Every channel owns one [`Sequencer`]; only Quad channels wire up the sweep unit
//! (Wave and Noise leave it disabled, matching the reference's per-channel flags set
//! right after construction).

#[derive(Debug, Clone, Copy)]
pub struct Envelope {
    pub enabled: bool,
    pub initial_volume: u8,
    /// `true` = volume increases toward 15 each step; `false` = decreases toward 0.
    pub direction: bool,
    pub divider_period: u8,
    timer: u8,
    pub current_volume: u8,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_volume: 0,
            direction: false,
            divider_period: 0,
            timer: 0,
            current_volume: 0,
        }
    }
}

impl Envelope {
    fn restart(&mut self) {
        self.current_volume = self.initial_volume;
        self.timer = self.divider_period;
    }

    /// Clocked once per frame-sequencer step 7 (64 Hz).
    fn clock(&mut self) {
        if !self.enabled || self.divider_period == 0 {
            return;
        }
        if self.timer > 0 {
            self.timer -= 1;
        }
        if self.timer == 0 {
            self.timer = self.divider_period;
            if self.direction && self.current_volume < 15 {
                self.current_volume += 1;
            } else if !self.direction && self.current_volume > 0 {
                self.current_volume -= 1;
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sweep {
    pub enabled: bool,
    pub shift: u8,
    /// `true` = subtract (frequency decreases); `false` = add.
    pub direction: bool,
    pub divider: u8,
    timer: u8,
    pub initial_freq: u16,
    pub current_freq: u16,
    /// Set once a sweep calculation overflows past 2047; the channel stays silent
    /// until the next trigger (`restart`) regardless of further writes.
    pub channel_disabled: bool,
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            enabled: false,
            shift: 0,
            direction: false,
            divider: 0,
            timer: 0,
            initial_freq: 0,
            current_freq: 0,
            channel_disabled: false,
        }
    }
}

impl Sweep {
    fn restart(&mut self) {
        self.current_freq = self.initial_freq;
        self.channel_disabled = false;
        self.timer = if self.divider == 0 { 8 } else { self.divider };
    }

    /// Clocked once per frame-sequencer steps 2 and 6 (128 Hz).
    fn clock(&mut self) {
        if !self.enabled || self.divider == 0 {
            return;
        }
        if self.timer > 0 {
            self.timer -= 1;
        }
        if self.timer != 0 {
            return;
        }
        self.timer = self.divider;
        let delta = self.current_freq >> self.shift;
        let new_freq = if self.direction {
            self.current_freq.saturating_sub(delta)
        } else {
            self.current_freq + delta
        };
        if new_freq > 2047 {
            self.channel_disabled = true;
        } else if self.shift != 0 {
            self.current_freq = new_freq;
            self.initial_freq = new_freq;
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sequencer {
    pub envelope: Envelope,
    pub sweep: Sweep,
    pub length: i32,
}

impl Sequencer {
    pub fn reset(&mut self) {
        let envelope_enabled = self.envelope.enabled;
        let sweep_enabled = self.sweep.enabled;
        *self = Sequencer::default();
        self.envelope.enabled = envelope_enabled;
        self.sweep.enabled = sweep_enabled;
    }

    /// Re-arm envelope and sweep on a trigger write (register bit 7 set). Length is
    /// reloaded separately by the channel, since its reload value/width differs per
    /// channel (64 for Quad/Noise, 256 for Wave).
    pub fn restart(&mut self) {
        self.envelope.restart();
        self.sweep.restart();
    }

    pub fn clock_length(&mut self, length_enable: bool) {
        if length_enable && self.length > 0 {
            self.length -= 1;
        }
    }

    pub fn clock_envelope(&mut self) {
        self.envelope.clock();
    }

    pub fn clock_sweep(&mut self) {
        self.sweep.clock();
    }
}

/// The 512 Hz frame sequencer's 8-step cycle: length clocks on even steps, sweep on
/// steps 2 and 6, envelope on step 7.
pub fn clocks_length(step: u8) -> bool {
    step % 2 == 0
}

pub fn clocks_sweep(step: u8) -> bool {
    step == 2 || step == 6
}

pub fn clocks_envelope(step: u8) -> bool {
    step == 7
}
