//! Top-level emulator: owns every component and drives one 70,224-cycle frame at a time.
//!
//! Ported from the reference `GameBoy` class (`gameboy.hpp`): construction order (scheduler
//! and leaf components before the bus, the bus before the CPU), `LoadBootROM`/`LoadGame`
//! validation promoted to a `Result`-returning API (see `error.rs`), and `Frame`'s
//! halted-vs-stepping branch.

use std::path::Path;

use crate::bus::{Bus, Memory};
use crate::cartridge::Cartridge;
use crate::cpu::Cpu;
use crate::error::EmulatorError;
use crate::joypad::Key;
use crate::ppu::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// T-cycles in one full frame: 154 scanlines x 456 T-cycles.
pub const CYCLES_PER_FRAME: u64 = 70_224;

pub struct Emulator {
    memory: Memory,
    cpu: Cpu,
}

impl Emulator {
    pub fn new() -> Self {
        Self { memory: Memory::new(), cpu: Cpu::new() }
    }

    pub fn reset(&mut self) {
        self.memory.reset();
        self.cpu.reset();
    }

    pub fn load_boot_rom(&mut self, data: &[u8]) -> Result<(), EmulatorError> {
        self.memory.load_boot_rom(data)
    }

    /// Loads `data` as a cartridge image, choosing a mapper from the header byte at 0x147.
    /// `save_path` is only opened for battery-backed mappers.
    pub fn load_game(&mut self, data: Vec<u8>, save_path: &Path) -> Result<(), EmulatorError> {
        let cartridge = Cartridge::load(data, save_path)?;
        self.memory.attach_cartridge(cartridge);
        Ok(())
    }

    pub fn set_key_state(&mut self, key: Key, pressed: bool) {
        self.memory.joypad.set_key_state(key, pressed);
    }

    pub fn set_audio_output_rate(&mut self, rate: u32) {
        self.memory.apu.set_output_sample_rate(rate);
    }

    pub fn audio_stream(&self) -> crate::apu::apu::AudioStream {
        self.memory.apu.audio_stream()
    }

    /// Runs exactly one frame (70,224 T-cycles) and copies the finished framebuffer into
    /// `pixel_buffer` (must be `SCREEN_WIDTH * SCREEN_HEIGHT` ARGB8888 pixels).
    ///
    /// While halted, the CPU executes nothing; the bus is ticked directly so timers, the PPU
    /// and the APU keep advancing until an interrupt wakes it — matching the reference's
    /// `scheduler->AddCycles(4); scheduler->Step(); apu->Step();` branch.
    pub fn frame(&mut self, pixel_buffer: &mut [u32]) {
        let target = self.memory.scheduler.now() + CYCLES_PER_FRAME;

        while self.memory.scheduler.now() < target {
            if self.cpu.halted {
                self.memory.tick(4);
            } else {
                self.cpu.step(&mut self.memory);
            }
            self.memory.service_interrupts(&mut self.cpu);
        }

        if self.memory.ppu.frame_ready() {
            pixel_buffer[..SCREEN_WIDTH * SCREEN_HEIGHT]
                .copy_from_slice(self.memory.ppu.framebuffer());
            self.memory.ppu.clear_frame_ready();
        }
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_rom() -> Vec<u8> {
        let mut data = vec![0u8; 0x8000];
        data[0x147] = 0x00;
        data
    }

    #[test]
    fn frame_advances_scheduler_by_exactly_one_frame_worth_of_cycles() {
        let mut emulator = Emulator::new();
        emulator.load_game(blank_rom(), Path::new("/dev/null")).unwrap();
        let start = emulator.memory.scheduler.now();
        let mut buffer = vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT];
        emulator.frame(&mut buffer);
        assert!(emulator.memory.scheduler.now() - start >= CYCLES_PER_FRAME);
    }

    #[test]
    fn set_key_state_reaches_the_joypad() {
        let mut emulator = Emulator::new();
        emulator.set_key_state(Key::A, true);
        assert_eq!(emulator.memory.joypad.read() & 1, 0);
    }
}
