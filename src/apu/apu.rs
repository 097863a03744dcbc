//! Game Boy APU: two square (Quad) channels, one Wave channel, one Noise channel, a
//! 512 Hz frame sequencer clocking their length/envelope/sweep units, a mixer that
//! downsamples to 65,536 Hz, and a windowed-sinc resampler feeding a bounded ring
//! buffer a pull-based `rodio::Source` drains on the audio thread.
//!
//! Ported from `apu.hpp`/`apu.cpp` (register map, `Step`'s mixing formula, frame
//! sequencer timing) and `channel/channel_quad.cpp`, `channel_wave.hpp`/`.cpp` (per-channel
//! synthesis); `channel_noise.hpp`'s synthesis interval, with its generation body authored
//! from general documentation since `channel_noise.cpp` wasn't retrieved. The reference's
//! register enum has no NR50/NR51/NR52 (master volume, panning, power control) — mono
//! mixing only, mirrored here rather than added as a missing feature.

use std::sync::{Arc, Mutex};

use crate::apu::channel_noise::NoiseChannel;
use crate::apu::channel_quad::QuadChannel;
use crate::apu::channel_wave::WaveChannel;
use crate::apu::resampler::SincResampler;
use crate::apu::ring_buffer::StereoRingBuffer;
use crate::apu::sequencer;
use crate::scheduler::{ChannelId, EventKind, Scheduler};

const REG_NR10: u8 = 0x10;
const REG_NR11: u8 = 0x11;
const REG_NR12: u8 = 0x12;
const REG_NR13: u8 = 0x13;
const REG_NR14: u8 = 0x14;
const REG_NR21: u8 = 0x16;
const REG_NR22: u8 = 0x17;
const REG_NR23: u8 = 0x18;
const REG_NR24: u8 = 0x19;
const REG_NR30: u8 = 0x1A;
const REG_NR31: u8 = 0x1B;
const REG_NR32: u8 = 0x1C;
const REG_NR33: u8 = 0x1D;
const REG_NR34: u8 = 0x1E;
const REG_NR41: u8 = 0x20;
const REG_NR42: u8 = 0x21;
const REG_NR43: u8 = 0x22;
const REG_NR44: u8 = 0x23;
const REG_WAVERAM_START: u8 = 0x30;
const REG_WAVERAM_END: u8 = 0x3F;

/// 512 Hz relative to the 4,194,304 Hz T-cycle clock.
const FRAME_SEQUENCER_INTERVAL: u64 = 8192;

/// ~64 ms of headroom at the internal 65,536 Hz mixer rate, enough to absorb scheduling
/// jitter between the emulation and audio threads without audible latency.
const RING_BUFFER_CAPACITY: usize = 4096;

pub struct Apu {
    psg1: QuadChannel,
    psg2: QuadChannel,
    psg3: WaveChannel,
    psg4: NoiseChannel,

    frame_sequencer_step: u8,
    frequency_divider: u8,
    averaged_sample: f32,

    resampler: SincResampler,
    output_rate: u32,
    buffer: Arc<Mutex<StereoRingBuffer>>,
}

impl Apu {
    pub fn new() -> Self {
        Self {
            psg1: QuadChannel::new(ChannelId::Quad1, true),
            psg2: QuadChannel::new(ChannelId::Quad2, false),
            psg3: WaveChannel::new(),
            psg4: NoiseChannel::new(),
            frame_sequencer_step: 0,
            frequency_divider: 0,
            averaged_sample: 0.0,
            resampler: SincResampler::new(44_100),
            output_rate: 44_100,
            buffer: Arc::new(Mutex::new(StereoRingBuffer::new(RING_BUFFER_CAPACITY))),
        }
    }

    pub fn reset(&mut self, scheduler: &mut Scheduler) {
        self.psg1.reset(scheduler);
        self.psg2.reset(scheduler);
        self.psg3.reset(scheduler);
        self.psg4.reset(scheduler);
        self.frame_sequencer_step = 0;
        self.frequency_divider = 0;
        self.averaged_sample = 0.0;
        scheduler.add(FRAME_SEQUENCER_INTERVAL, EventKind::ApuFrameSequencer);
    }

    pub fn set_output_sample_rate(&mut self, rate: u32) {
        self.output_rate = rate;
        self.resampler.set_output_rate(rate);
    }

    /// A fresh handle onto the shared output stream. Hand this to `rodio::Sink::append`;
    /// rodio pulls samples from it on its own playback thread.
    pub fn audio_stream(&self) -> AudioStream {
        AudioStream {
            buffer: Arc::clone(&self.buffer),
            sample_rate: self.output_rate,
            pending_right: 0.0,
            have_pending_right: false,
        }
    }

    /// Mixes the four channels' current samples into the shared ring buffer. Called on
    /// every 4-cycle memory-bus beat (~1,048,576 Hz), matching `Bus::tick`.
    pub fn step(&mut self) {
        self.averaged_sample += (self.psg1.sample as f32 / 128.0
            + self.psg2.sample as f32 / 128.0
            + self.psg3.sample as f32 / 128.0
            + self.psg4.sample as f32 / 128.0)
            * 0.25;
        self.frequency_divider += 1;
        if self.frequency_divider == 16 {
            self.frequency_divider = 0;
            let sample = self.averaged_sample / 16.0;
            self.averaged_sample = 0.0;
            self.resampler.push((sample, sample));
            while self.resampler.ready() {
                let frame = self.resampler.pop();
                let mut buffer = self.buffer.lock().expect("apu ring buffer poisoned");
                if !buffer.push(frame) {
                    log::debug!("apu output buffer full, dropping a sample");
                }
            }
        }
    }

    pub fn step_frame_sequencer(&mut self, scheduler: &mut Scheduler, cycles_late: u64) {
        if sequencer::clocks_length(self.frame_sequencer_step) {
            self.psg1.clock_length();
            self.psg2.clock_length();
            self.psg3.clock_length();
            self.psg4.clock_length();
        }
        if sequencer::clocks_sweep(self.frame_sequencer_step) {
            self.psg1.clock_sweep();
            self.psg2.clock_sweep();
        }
        if sequencer::clocks_envelope(self.frame_sequencer_step) {
            self.psg1.clock_envelope();
            self.psg2.clock_envelope();
            self.psg4.clock_envelope();
        }
        self.frame_sequencer_step = (self.frame_sequencer_step + 1) % 8;
        scheduler.add(
            FRAME_SEQUENCER_INTERVAL.saturating_sub(cycles_late),
            EventKind::ApuFrameSequencer,
        );
    }

    pub fn step_channel(&mut self, scheduler: &mut Scheduler, channel: ChannelId, cycles_late: u64) {
        match channel {
            ChannelId::Quad1 => self.psg1.generate(scheduler, cycles_late),
            ChannelId::Quad2 => self.psg2.generate(scheduler, cycles_late),
            ChannelId::Wave => self.psg3.generate(scheduler, cycles_late),
            ChannelId::Noise => self.psg4.generate(scheduler, cycles_late),
        }
    }

    pub fn read_mmio(&self, reg: u8) -> u8 {
        match reg {
            REG_NR10 => self.psg1.read(0),
            REG_NR11 => self.psg1.read(1),
            REG_NR12 => self.psg1.read(2),
            REG_NR14 => self.psg1.read(4),
            REG_NR21 => self.psg2.read(1),
            REG_NR22 => self.psg2.read(2),
            REG_NR24 => self.psg2.read(4),
            REG_NR30 => self.psg3.read(0),
            REG_NR32 => self.psg3.read(2),
            REG_NR34 => self.psg3.read(4),
            REG_WAVERAM_START..=REG_WAVERAM_END => self.psg3.read_sample(reg - REG_WAVERAM_START),
            REG_NR42 => self.psg4.read(1),
            REG_NR43 => self.psg4.read(2),
            REG_NR44 => self.psg4.read(3),
            _ => 0,
        }
    }

    pub fn write_mmio(&mut self, scheduler: &mut Scheduler, reg: u8, value: u8) {
        let _ = scheduler; // channels schedule their own next-generation event lazily
        match reg {
            REG_NR10 => self.psg1.write(0, value),
            REG_NR11 => self.psg1.write(1, value),
            REG_NR12 => self.psg1.write(2, value),
            REG_NR13 => self.psg1.write(3, value),
            REG_NR14 => self.psg1.write(4, value),
            REG_NR21 => self.psg2.write(1, value),
            REG_NR22 => self.psg2.write(2, value),
            REG_NR23 => self.psg2.write(3, value),
            REG_NR24 => self.psg2.write(4, value),
            REG_NR30 => self.psg3.write(0, value),
            REG_NR31 => self.psg3.write(1, value),
            REG_NR32 => self.psg3.write(2, value),
            REG_NR33 => self.psg3.write(3, value),
            REG_NR34 => self.psg3.write(4, value),
            REG_WAVERAM_START..=REG_WAVERAM_END => {
                self.psg3.write_sample(reg - REG_WAVERAM_START, value)
            }
            REG_NR41 => self.psg4.write(0, value),
            REG_NR42 => self.psg4.write(1, value),
            REG_NR43 => self.psg4.write(2, value),
            REG_NR44 => self.psg4.write(3, value),
            _ => log::debug!("unhandled APU register write 0xFF{reg:02X} = 0x{value:02X}"),
        }
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull-based stereo source: rodio calls `next()` on its own thread, draining the shared
/// ring buffer one interleaved sample at a time and falling back to silence on underrun
/// rather than blocking the audio callback.
pub struct AudioStream {
    buffer: Arc<Mutex<StereoRingBuffer>>,
    sample_rate: u32,
    pending_right: f32,
    have_pending_right: bool,
}

impl Iterator for AudioStream {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.have_pending_right {
            self.have_pending_right = false;
            return Some(self.pending_right);
        }
        let (left, right) = self
            .buffer
            .lock()
            .expect("apu ring buffer poisoned")
            .pop()
            .unwrap_or((0.0, 0.0));
        self.pending_right = right;
        self.have_pending_right = true;
        Some(left)
    }
}

impl rodio::Source for AudioStream {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<std::time::Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_sequencer_clocks_length_on_even_steps_only() {
        let mut apu = Apu::new();
        let mut scheduler = Scheduler::new();
        apu.reset(&mut scheduler);
        apu.psg1.write(1, 0x3F); // length = 64 - 63 = 1
        apu.psg1.write(4, 0x40); // length_enable, no trigger
        apu.step_frame_sequencer(&mut scheduler, 0); // step 0 is even: clocks length to 0
        apu.psg1.generate(&mut scheduler, 0);
        assert_eq!(apu.psg1.sample, 0); // length expired -> silent
    }

    #[test]
    fn wave_ram_round_trips_through_mmio() {
        let mut apu = Apu::new();
        let mut scheduler = Scheduler::new();
        apu.reset(&mut scheduler);
        apu.write_mmio(&mut scheduler, REG_WAVERAM_START, 0xAB);
        assert_eq!(apu.read_mmio(REG_WAVERAM_START), 0xAB);
    }

    #[test]
    fn mixer_emits_a_sample_every_sixteen_steps() {
        let mut apu = Apu::new();
        for _ in 0..16 {
            apu.step();
        }
        assert_eq!(apu.buffer.lock().unwrap().len(), 1);
    }
}
