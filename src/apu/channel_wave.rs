//! Wave channel: 32 4-bit samples (16 bytes of wave RAM) played back at a programmable
//! rate and scaled by one of four fixed volume codes.

use crate::apu::sequencer::Sequencer;
use crate::scheduler::{ChannelId, EventKind, Scheduler};

const VOLUME_TABLE: [i32; 4] = [0, 4, 2, 1];

/// One nibble is output every `(2048 - freq) * 2` T-cycles. Ported directly from
/// `channel_wave.hpp`'s `GetSynthesisIntervalFromFrequency`.
fn synthesis_interval(freq: u16) -> u64 {
    2 * (2048 - freq as u64)
}

pub struct WaveChannel {
    sequencer: Sequencer,
    phase: u8,
    pub sample: i8,

    enabled: bool,
    force_volume: bool,
    volume: u8,
    frequency: u16,
    length_enable: bool,

    wave_ram: [u8; 16],
}

impl WaveChannel {
    pub fn new() -> Self {
        let mut sequencer = Sequencer::default();
        sequencer.sweep.enabled = false;
        sequencer.envelope.enabled = false;
        Self {
            sequencer,
            phase: 0,
            sample: 0,
            enabled: false,
            force_volume: false,
            volume: 0,
            frequency: 0,
            length_enable: false,
            wave_ram: [0; 16],
        }
    }

    pub fn reset(&mut self, scheduler: &mut Scheduler) {
        self.sequencer.reset();
        self.phase = 0;
        self.sample = 0;
        self.enabled = false;
        self.force_volume = false;
        self.volume = 0;
        self.frequency = 0;
        self.length_enable = false;
        self.wave_ram = [0; 16];
        scheduler.add(synthesis_interval(0), EventKind::ApuChannel(ChannelId::Wave));
    }

    pub fn clock_length(&mut self) {
        self.sequencer.clock_length(self.length_enable);
    }

    pub fn generate(&mut self, scheduler: &mut Scheduler, cycles_late: u64) {
        if !self.enabled || (self.length_enable && self.sequencer.length <= 0) {
            self.sample = 0;
            let interval = synthesis_interval(0).saturating_sub(cycles_late);
            scheduler.add(interval, EventKind::ApuChannel(ChannelId::Wave));
            return;
        }

        let byte = self.wave_ram[(self.phase / 2) as usize];
        let nibble = if self.phase % 2 == 0 { byte >> 4 } else { byte & 0xF };

        let scale = if self.force_volume { 3 } else { VOLUME_TABLE[self.volume as usize] };
        // Saturate rather than wrap: real hardware's "100% forced volume" case can
        // exceed i8 range (see the reference's own "might overflow" note).
        self.sample = ((nibble as i32 - 8) * 4 * scale).clamp(-128, 127) as i8;

        self.phase = (self.phase + 1) % 32;

        let interval = synthesis_interval(self.frequency).saturating_sub(cycles_late);
        scheduler.add(interval, EventKind::ApuChannel(ChannelId::Wave));
    }

    pub fn read(&self, offset: u8) -> u8 {
        match offset {
            0 => {
                if self.enabled {
                    0x80
                } else {
                    0
                }
            }
            2 => (self.volume as u8) << 5 | if self.force_volume { 0x80 } else { 0 },
            4 => {
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
            0 => self.enabled = value & 0x80 != 0,
            1 => self.sequencer.length = 256 - value as i32,
            2 => {
                self.volume = (value >> 5) & 3;
                self.force_volume = value & 0x80 != 0;
            }
            3 => self.frequency = (self.frequency & !0xFF) | value as u16,
            4 => {
                self.frequency = (self.frequency & 0xFF) | (((value & 7) as u16) << 8);
                self.length_enable = value & 0x40 != 0;
                if value & 0x80 != 0 {
                    self.phase = 0;
                    self.sequencer.restart();
                }
            }
            _ => {}
        }
    }

    pub fn read_sample(&self, offset: u8) -> u8 {
        self.wave_ram[offset as usize & 0xF]
    }

    pub fn write_sample(&mut self, offset: u8, value: u8) {
        self.wave_ram[offset as usize & 0xF] = value;
    }
}

impl Default for WaveChannel {
    fn default() -> Self {
        Self::new()
    }
}
