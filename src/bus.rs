//! Memory bus and address decoding for the Game Boy.
//!
//! Implements the [memory map](https://gbdev.io/pandocs/Memory_Map.html): address decode by
//! the top nibble, MMIO sub-dispatch by the low byte, a boot ROM overlay active until
//! 0xFF50 is written, and echo RAM. Every access costs 4 T-cycles, advanced through the
//! [`Scheduler`] before the byte is returned — this is how wall-clock time enters the
//! emulation at all. Ported from the reference `Memory` class (`memory.hpp`/`memory.cpp`).

use crate::apu::apu::Apu;
use crate::cartridge::Cartridge;
use crate::error::EmulatorError;
use crate::irq::Irq;
use crate::joypad::Joypad;
use crate::ppu::ppu::Ppu;
use crate::scheduler::{EventKind, Scheduler};
use crate::timer::Timer;

const REG_JOYPAD: u8 = 0x00;
const TIMER_MIN_REG: u8 = 0x04;
const TIMER_MAX_REG: u8 = 0x07;
const APU_MIN_REG: u8 = 0x10;
const APU_MAX_REG: u8 = 0x3F;
const PPU_MIN_REG: u8 = 0x40;
const PPU_MAX_REG: u8 = 0x4B;
const REG_OAM_DMA: u8 = 0x46;
const REG_BOOTROM_DISABLE: u8 = 0x50;

/// Byte-addressable bus the CPU drives. `read`/`write` cost 4 T-cycles each; `tick` lets
/// the CPU account for cycles an instruction spends with no memory access (internal ALU
/// work on a 16-bit pair, the idle cycle before a conditional branch is taken, ...).
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);
    fn tick(&mut self, cycles: u64);
}

pub struct Memory {
    pub scheduler: Scheduler,
    pub irq: Irq,
    pub timer: Timer,
    pub joypad: Joypad,
    pub ppu: Ppu,
    pub apu: Apu,
    pub cartridge: Option<Cartridge>,

    boot: [u8; 0x100],
    boot_cgb: [u8; 0x700],
    enable_is_cgb: bool,
    bootrom_disable: bool,
    wram: [u8; 0x2000],
    hram: [u8; 0x7F],
}

impl Memory {
    pub fn new() -> Self {
        let mut memory = Self {
            scheduler: Scheduler::new(),
            irq: Irq::new(),
            timer: Timer::new(),
            joypad: Joypad::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            cartridge: None,
            boot: [0; 0x100],
            boot_cgb: [0; 0x700],
            enable_is_cgb: false,
            bootrom_disable: false,
            wram: [0; 0x2000],
            hram: [0; 0x7F],
        };
        memory.reset();
        memory
    }

    pub fn reset(&mut self) {
        self.wram = [0; 0x2000];
        self.hram = [0; 0x7F];
        self.bootrom_disable = false;
        self.scheduler.reset();
        self.irq.reset();
        self.joypad.reset();
        self.timer.reset(&mut self.scheduler);
        self.ppu.reset(&mut self.scheduler);
        self.apu.reset(&mut self.scheduler);
    }

    pub fn load_boot_rom(&mut self, data: &[u8]) -> Result<(), EmulatorError> {
        match data.len() {
            256 => {
                self.boot.copy_from_slice(data);
                self.enable_is_cgb = false;
                Ok(())
            }
            2304 => {
                self.boot.copy_from_slice(&data[..256]);
                self.boot_cgb.copy_from_slice(&data[0x200..0x200 + 0x700]);
                self.enable_is_cgb = true;
                Ok(())
            }
            other => Err(EmulatorError::BadBootRomSize(other)),
        }
    }

    pub fn attach_cartridge(&mut self, cartridge: Cartridge) {
        self.cartridge = Some(cartridge);
    }

    /// Push `cpu.pc` and jump to the highest-priority pending interrupt's vector, if IME
    /// allows it. Lives here rather than on `Irq` because dispatch needs the bus to push
    /// the return address, and `Irq` is itself a field of this bus — defining it as an
    /// inherent method keeps the whole operation under one `&mut self` borrow instead of
    /// trying to alias `self` and `self.irq` at once.
    pub fn service_interrupts(&mut self, cpu: &mut crate::cpu::cpu::Cpu) {
        if !self.irq.pending() {
            return;
        }
        cpu.halted = false;
        if !cpu.ime {
            return;
        }
        let Some((index, vector)) = self.irq.highest_priority_pending() else {
            return;
        };
        self.irq.acknowledge(index);
        cpu.ime = false;
        let pc = cpu.pc;
        cpu.sp = cpu.sp.wrapping_sub(1);
        self.write(cpu.sp, (pc >> 8) as u8);
        cpu.sp = cpu.sp.wrapping_sub(1);
        self.write(cpu.sp, pc as u8);
        cpu.pc = vector;
    }

    fn read_mmio(&self, reg: u8) -> u8 {
        if reg == REG_JOYPAD {
            return self.joypad.read();
        }
        if (TIMER_MIN_REG..=TIMER_MAX_REG).contains(&reg) {
            return self.timer.read_mmio(reg);
        }
        if (APU_MIN_REG..=APU_MAX_REG).contains(&reg) {
            return self.apu.read_mmio(reg);
        }
        if (PPU_MIN_REG..=PPU_MAX_REG).contains(&reg) {
            return self.ppu.read_mmio(reg);
        }
        if reg == crate::irq::REG_IE || reg == crate::irq::REG_IF {
            return self.irq.read_mmio(reg);
        }
        log::debug!("unhandled MMIO read from 0xFF{reg:02X}");
        0
    }

    fn write_mmio(&mut self, reg: u8, value: u8) {
        if reg == REG_JOYPAD {
            self.joypad.write(value);
            return;
        }
        if (TIMER_MIN_REG..=TIMER_MAX_REG).contains(&reg) {
            self.timer.write_mmio(&mut self.scheduler, reg, value);
            return;
        }
        if (APU_MIN_REG..=APU_MAX_REG).contains(&reg) {
            self.apu.write_mmio(&mut self.scheduler, reg, value);
            return;
        }
        if (PPU_MIN_REG..=PPU_MAX_REG).contains(&reg) {
            if reg == REG_OAM_DMA {
                let src = (value as u16) << 8;
                for i in 0..0xA0u16 {
                    let byte = self.read(src + i);
                    self.ppu.write_oam(i as u8, byte);
                }
                return;
            }
            self.ppu.write_mmio(&mut self.irq, reg, value);
            return;
        }
        if reg == crate::irq::REG_IE || reg == crate::irq::REG_IF {
            self.irq.write_mmio(reg, value);
            return;
        }
        if reg == REG_BOOTROM_DISABLE {
            self.bootrom_disable = value & 1 != 0;
            return;
        }
        log::debug!("unhandled MMIO write to 0xFF{reg:02X} = 0x{value:02X}");
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for Memory {
    /// Advance the shared cycle counter and drain every scheduler event that falls due,
    /// dispatching each back into its owning component. Mirrors the reference's
    /// `scheduler->AddCycles(n); scheduler->Step(); apu->Step();` idiom.
    fn tick(&mut self, cycles: u64) {
        self.scheduler.add_cycles(cycles);
        while let Some((kind, late)) = self.scheduler.pop_due() {
            match kind {
                EventKind::TimerDiv => self.timer.step_div(&mut self.scheduler, late),
                EventKind::TimerTima => {
                    self.timer.step_tima(&mut self.scheduler, &mut self.irq, late)
                }
                EventKind::PpuModeChange => {
                    self.ppu.step_mode(&mut self.scheduler, &mut self.irq, late)
                }
                EventKind::ApuFrameSequencer => self.apu.step_frame_sequencer(&mut self.scheduler, late),
                EventKind::ApuChannel(channel) => {
                    self.apu.step_channel(&mut self.scheduler, channel, late)
                }
            }
        }
        self.apu.step();
    }

    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr >> 12 {
            0x0..=0x7 | 0xA..=0xB => {
                if !self.bootrom_disable {
                    if addr <= 0xFF {
                        return self.finish_read(self.boot[addr as usize]);
                    }
                    if self.enable_is_cgb && (0x200..=0x8FF).contains(&addr) {
                        return self.finish_read(self.boot_cgb[(addr - 0x200) as usize]);
                    }
                }
                match &self.cartridge {
                    Some(cart) => cart.read(addr),
                    None => 0xFF,
                }
            }
            0x8..=0x9 => self.ppu.read_vram(addr & 0x1FFF),
            0xC..=0xD => self.wram[(addr & 0x1FFF) as usize],
            0xE => self.wram[(addr & 0xFFF) as usize],
            0xF => {
                if addr <= 0xFDFF {
                    self.wram[0x1000 + (addr & 0xDFF) as usize]
                } else if addr <= 0xFE9F {
                    self.ppu.read_oam((addr & 0x9F) as u8)
                } else if addr <= 0xFEFF {
                    log::debug!("unhandled read from unused memory region");
                    0
                } else if addr <= 0xFF7F || addr == 0xFFFF {
                    self.read_mmio((addr & 0xFF) as u8)
                } else {
                    self.hram[(addr & 0x7F) as usize]
                }
            }
            _ => unreachable!("u16 >> 12 is always 0..=0xF"),
        };
        self.finish_read(value)
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr >> 12 {
            0x0..=0x7 | 0xA..=0xB => {
                if let Some(cart) = self.cartridge.as_mut() {
                    cart.write(addr, value);
                }
            }
            0x8..=0x9 => self.ppu.write_vram(addr & 0x1FFF, value),
            0xC..=0xD => self.wram[(addr & 0x1FFF) as usize] = value,
            0xE => self.wram[(addr & 0xFFF) as usize] = value,
            0xF => {
                if addr <= 0xFDFF {
                    self.wram[0x1000 + (addr & 0xDFF) as usize] = value;
                } else if addr <= 0xFE9F {
                    self.ppu.write_oam((addr & 0x9F) as u8, value);
                } else if addr <= 0xFEFF {
                    log::debug!("unhandled write to unused memory region");
                } else if addr <= 0xFF7F || addr == 0xFFFF {
                    self.write_mmio((addr & 0xFF) as u8, value);
                } else {
                    self.hram[(addr & 0x7F) as usize] = value;
                }
            }
            _ => unreachable!("u16 >> 12 is always 0..=0xF"),
        }
        self.tick(4);
    }
}

impl Memory {
    fn finish_read(&mut self, value: u8) -> u8 {
        self.tick(4);
        value
    }
}

#[cfg(test)]
pub mod test_support {
    use super::Bus;

    /// Flat 64 KiB RAM bus for CPU unit tests — no MMIO, just a cycle counter.
    pub struct TestBus {
        pub mem: [u8; 0x10000],
        pub cycles: u64,
    }

    impl TestBus {
        pub fn new() -> Self {
            Self { mem: [0; 0x10000], cycles: 0 }
        }
    }

    impl Default for TestBus {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Bus for TestBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.tick(4);
            self.mem[addr as usize]
        }

        fn write(&mut self, addr: u16, value: u8) {
            self.mem[addr as usize] = value;
            self.tick(4);
        }

        fn tick(&mut self, cycles: u64) {
            self.cycles += cycles;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_rom_overlay_authoritative_until_disabled() {
        let mut memory = Memory::new();
        memory.load_boot_rom(&[0xAA; 256]).unwrap();
        let cart_data = {
            let mut d = vec![0u8; 0x8000];
            d[0] = 0x11;
            d
        };
        let cart = Cartridge::load(cart_data, std::path::Path::new("/dev/null")).unwrap();
        memory.attach_cartridge(cart);

        assert_eq!(memory.read(0x0000), 0xAA);
        memory.write_mmio(REG_BOOTROM_DISABLE, 1);
        assert_eq!(memory.read(0x0000), 0x11);
    }

    #[test]
    fn echo_ram_mirrors_wram() {
        let mut memory = Memory::new();
        memory.write(0xC005, 0x42);
        assert_eq!(memory.read(0xE005), 0x42);
    }

    #[test]
    fn service_interrupts_pushes_pc_and_jumps_to_vector() {
        use crate::cpu::cpu::Cpu;
        use crate::irq::Interrupt;

        let mut memory = Memory::new();
        let mut cpu = Cpu::new();
        cpu.ime = true;
        cpu.pc = 0x0150;
        cpu.sp = 0xFFFE;
        memory.irq.write_mmio(crate::irq::REG_IE, 0xFF);
        memory.irq.raise(Interrupt::VBlank);

        memory.service_interrupts(&mut cpu);

        assert_eq!(cpu.pc, 0x40);
        assert!(!cpu.ime);
        assert_eq!(cpu.sp, 0xFFFC);
        assert_eq!(memory.read(0xFFFC), 0x50);
        assert_eq!(memory.read(0xFFFD), 0x01);
    }

    #[test]
    fn halted_cpu_wakes_on_pending_interrupt_even_without_ime() {
        use crate::cpu::cpu::Cpu;
        use crate::irq::Interrupt;

        let mut memory = Memory::new();
        let mut cpu = Cpu::new();
        cpu.ime = false;
        cpu.halted = true;
        cpu.pc = 0x0200;
        memory.irq.write_mmio(crate::irq::REG_IE, 0xFF);
        memory.irq.raise(Interrupt::Timer);

        memory.service_interrupts(&mut cpu);

        assert!(!cpu.halted);
        assert_eq!(cpu.pc, 0x0200);
    }
}
