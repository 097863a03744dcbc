//! Noise channel: a 15-bit LFSR clocked at a programmable rate, optionally narrowed to
//! a 7-bit period for a higher-pitched metallic tone.

use crate::apu::sequencer::Sequencer;
use crate::scheduler::{ChannelId, EventKind, Scheduler};

fn synthesis_interval(ratio: u8, shift: u8) -> u64 {
    let interval = if ratio == 0 { 8u64 } else { 16 * ratio as u64 };
    interval << shift
}

pub struct NoiseChannel {
    sequencer: Sequencer,
    lfsr: u16,
    pub sample: i8,

    frequency_shift: u8,
    frequency_ratio: u8,
    narrow_width: bool,
    length_enable: bool,
}

impl NoiseChannel {
    pub fn new() -> Self {
        let mut sequencer = Sequencer::default();
        sequencer.sweep.enabled = false;
        sequencer.envelope.enabled = true;
        Self {
            sequencer,
            lfsr: 0x7FFF,
            sample: 0,
            frequency_shift: 0,
            frequency_ratio: 0,
            narrow_width: false,
            length_enable: false,
        }
    }

    pub fn reset(&mut self, scheduler: &mut Scheduler) {
        self.sequencer.reset();
        self.lfsr = 0x7FFF;
        self.sample = 0;
        self.frequency_shift = 0;
        self.frequency_ratio = 0;
        self.narrow_width = false;
        self.length_enable = false;
        scheduler.add(synthesis_interval(0, 0), EventKind::ApuChannel(ChannelId::Noise));
    }

    pub fn clock_length(&mut self) {
        self.sequencer.clock_length(self.length_enable);
    }

    pub fn clock_envelope(&mut self) {
        self.sequencer.clock_envelope();
    }

    pub fn generate(&mut self, scheduler: &mut Scheduler, cycles_late: u64) {
        if self.length_enable && self.sequencer.length <= 0 {
            self.sample = 0;
            let interval = synthesis_interval(0, 0).saturating_sub(cycles_late);
            scheduler.add(interval, EventKind::ApuChannel(ChannelId::Noise));
            return;
        }

        let bit = (self.lfsr & 1) ^ ((self.lfsr >> 1) & 1);
        self.lfsr >>= 1;
        self.lfsr |= bit << 14;
        if self.narrow_width {
            self.lfsr = (self.lfsr & !(1 << 6)) | (bit << 6);
        }

        let volume = self.sequencer.envelope.current_volume as i8;
        self.sample = if self.lfsr & 1 == 0 { volume } else { -volume };

        let interval = synthesis_interval(self.frequency_ratio, self.frequency_shift)
            .saturating_sub(cycles_late);
        scheduler.add(interval, EventKind::ApuChannel(ChannelId::Noise));
    }

    pub fn read(&self, offset: u8) -> u8 {
        let envelope = &self.sequencer.envelope;
        match offset {
            1 => envelope.divider_period | (envelope.direction as u8) << 3 | envelope.initial_volume << 4,
            2 => {
                self.frequency_ratio
                    | (self.narrow_width as u8) << 3
                    | self.frequency_shift << 4
            }
            3 => {
                if self.length_enable {
                    0x40
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    pub fn write(&mut self, offset: u8, value: u8) {
        match offset {
            0 => self.sequencer.length = 64 - (value & 63) as i32,
            1 => {
                let envelope = &mut self.sequencer.envelope;
                envelope.divider_period = value & 7;
                envelope.direction = (value >> 3) & 1 != 0;
                envelope.initial_volume = value >> 4;
            }
            2 => {
                self.frequency_ratio = value & 7;
                self.narrow_width = value & 0x08 != 0;
                self.frequency_shift = value >> 4;
            }
            3 => {
                self.length_enable = value & 0x40 != 0;
                if value & 0x80 != 0 {
                    self.lfsr = 0x7FFF;
                    self.sequencer.restart();
                }
            }
            _ => {}
        }
    }
}

impl Default for NoiseChannel {
    fn default() -> Self {
        Self::new()
    }
}
