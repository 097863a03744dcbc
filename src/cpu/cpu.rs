//! Sharp SM83 CPU emulation for the Game Boy.
//!
//! Implements the full instruction set, including every CB-prefixed opcode, through one
//! opcode-dispatch match: distinctive opcodes (0x00-0x3F, 0xC0-0xFF) each get their own arm,
//! while the two uniform blocks — 0x40-0x7F (`LD r,r'`) and 0x80-0xBF (`ALU A,r`) — and the
//! entire CB table are decoded generically by register/operation index, the way
//! `get_reg`/`set_reg` decode an operand index elsewhere in the Game Boy ecosystem.
//!
//! `Cpu` does not own its bus. `step` takes one by trait object reference each call: the bus
//! (`Memory`) owns the interrupt controller that dispatches back into the CPU, so a `Cpu`
//! that owned its `Bus` the way the teacher's `CPU<B: Bus>` does would need to mutably
//! borrow itself through the bus to service an interrupt. Taking `&mut dyn Bus` per call
//! avoids that entirely.

use crate::bus::Bus;
use crate::cpu::flags::{FLAG_CARRY, FLAG_HALF_CARRY, FLAG_NEGATIVE, FLAG_ZERO};

pub struct Cpu {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub ime: bool,
    pub halted: bool,
    pub instruction_count: u64,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            a: 0,
            f: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
            ime: false,
            halted: false,
            instruction_count: 0,
        }
    }

    /// Zeroes every register, as the reference `CPU::Reset` does. Booting then proceeds by
    /// executing the boot ROM from `pc = 0`, not by jumping straight to post-boot state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn af(&self) -> u16 {
        ((self.a as u16) << 8) | self.f as u16
    }

    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = (value & 0xF0) as u8;
    }

    pub fn bc(&self) -> u16 {
        ((self.b as u16) << 8) | self.c as u16
    }

    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    pub fn de(&self) -> u16 {
        ((self.d as u16) << 8) | self.e as u16
    }

    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    pub fn hl(&self) -> u16 {
        ((self.h as u16) << 8) | self.l as u16
    }

    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    fn flag(&self, mask: u8) -> bool {
        self.f & mask != 0
    }

    fn set_flag(&mut self, mask: u8, value: bool) {
        if value {
            self.f |= mask;
        } else {
            self.f &= !mask;
        }
    }

    fn fetch_byte(&mut self, bus: &mut dyn Bus) -> u8 {
        let byte = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn fetch_word(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.fetch_byte(bus) as u16;
        let hi = self.fetch_byte(bus) as u16;
        (hi << 8) | lo
    }

    fn push16(&mut self, bus: &mut dyn Bus, value: u16) {
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, (value >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, value as u8);
    }

    fn pop16(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = bus.read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        let hi = bus.read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    /// Operand index 0..=7 selects B,C,D,E,H,L,(HL),A; 6 routes through the bus.
    fn get_reg(&self, idx: u8, bus: &mut dyn Bus) -> u8 {
        match idx {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            6 => bus.read(self.hl()),
            7 => self.a,
            _ => unreachable!("register index is masked to 3 bits"),
        }
    }

    fn set_reg(&mut self, idx: u8, value: u8, bus: &mut dyn Bus) {
        match idx {
            0 => self.b = value,
            1 => self.c = value,
            2 => self.d = value,
            3 => self.e = value,
            4 => self.h = value,
            5 => self.l = value,
            6 => bus.write(self.hl(), value),
            7 => self.a = value,
            _ => unreachable!("register index is masked to 3 bits"),
        }
    }

    /// Pair index 0..=3 selects BC,DE,HL,SP (the `LD rr,d16` / `INC rr` / `ADD HL,rr` group).
    fn get_rr(&self, idx: u8) -> u16 {
        match idx {
            0 => self.bc(),
            1 => self.de(),
            2 => self.hl(),
            3 => self.sp,
            _ => unreachable!("pair index is masked to 2 bits"),
        }
    }

    fn set_rr(&mut self, idx: u8, value: u16) {
        match idx {
            0 => self.set_bc(value),
            1 => self.set_de(value),
            2 => self.set_hl(value),
            3 => self.sp = value,
            _ => unreachable!("pair index is masked to 2 bits"),
        }
    }

    /// Pair index 0..=3 selects BC,DE,HL,AF (the `PUSH rr` / `POP rr` group).
    fn get_rr_stack(&self, idx: u8) -> u16 {
        match idx {
            0 => self.bc(),
            1 => self.de(),
            2 => self.hl(),
            3 => self.af(),
            _ => unreachable!("pair index is masked to 2 bits"),
        }
    }

    fn set_rr_stack(&mut self, idx: u8, value: u16) {
        match idx {
            0 => self.set_bc(value),
            1 => self.set_de(value),
            2 => self.set_hl(value),
            3 => self.set_af(value),
            _ => unreachable!("pair index is masked to 2 bits"),
        }
    }

    fn check_cc(&self, cc: u8) -> bool {
        match cc {
            0 => !self.flag(FLAG_ZERO),
            1 => self.flag(FLAG_ZERO),
            2 => !self.flag(FLAG_CARRY),
            3 => self.flag(FLAG_CARRY),
            _ => unreachable!("condition index is masked to 2 bits"),
        }
    }

    /// Execute exactly one instruction. The caller is responsible for not calling this
    /// while `halted` — the top-level frame loop instead ticks the bus directly in that
    /// state, so scheduled timer/PPU/APU events keep firing.
    pub fn step(&mut self, bus: &mut dyn Bus) {
        let pc = self.pc;
        let opcode = self.fetch_byte(bus);
        log::trace!(
            "{pc:04X}: {opcode:02X}  A:{:02X} F:{:02X} BC:{:04X} DE:{:04X} HL:{:04X} SP:{:04X}",
            self.a,
            self.f,
            self.bc(),
            self.de(),
            self.hl(),
            self.sp
        );
        self.instruction_count = self.instruction_count.wrapping_add(1);
        self.execute(opcode, bus);
    }

    fn execute(&mut self, opcode: u8, bus: &mut dyn Bus) {
        match opcode {
            0x00 => {}
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.fetch_word(bus);
                self.set_rr((opcode >> 4) & 3, value);
            }
            0x02 => bus.write(self.bc(), self.a),
            0x12 => bus.write(self.de(), self.a),
            0x22 => {
                let addr = self.hl();
                bus.write(addr, self.a);
                self.set_hl(addr.wrapping_add(1));
            }
            0x32 => {
                let addr = self.hl();
                bus.write(addr, self.a);
                self.set_hl(addr.wrapping_sub(1));
            }
            0x03 | 0x13 | 0x23 | 0x33 => {
                let idx = (opcode >> 4) & 3;
                let value = self.get_rr(idx).wrapping_add(1);
                self.set_rr(idx, value);
                bus.tick(4);
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let idx = (opcode >> 4) & 3;
                let value = self.get_rr(idx).wrapping_sub(1);
                self.set_rr(idx, value);
                bus.tick(4);
            }
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                self.inc_r((opcode - 0x04) / 8, bus);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                self.dec_r((opcode - 0x05) / 8, bus);
            }
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let idx = (opcode - 0x06) / 8;
                let value = self.fetch_byte(bus);
                self.set_reg(idx, value, bus);
            }
            0x07 => self.rlca(),
            0x0F => self.rrca(),
            0x17 => self.rla(),
            0x1F => self.rra(),
            0x08 => {
                let addr = self.fetch_word(bus);
                bus.write(addr, self.sp as u8);
                bus.write(addr.wrapping_add(1), (self.sp >> 8) as u8);
            }
            0x09 | 0x19 | 0x29 | 0x39 => {
                let value = self.get_rr((opcode >> 4) & 3);
                self.add_hl(value);
                bus.tick(4);
            }
            0x0A => self.a = bus.read(self.bc()),
            0x1A => self.a = bus.read(self.de()),
            0x2A => {
                let addr = self.hl();
                self.a = bus.read(addr);
                self.set_hl(addr.wrapping_add(1));
            }
            0x3A => {
                let addr = self.hl();
                self.a = bus.read(addr);
                self.set_hl(addr.wrapping_sub(1));
            }
            0x10 => {
                // Speed-switch / low-power STOP is approximated as HALT: button-wake and
                // the CGB double-speed handshake are out of scope.
                log::debug!("STOP executed; approximating as HALT");
                let _ = self.fetch_byte(bus);
                self.halted = true;
            }
            0x18 => {
                let offset = self.fetch_byte(bus) as i8;
                self.pc = self.pc.wrapping_add(offset as i16 as u16);
                bus.tick(4);
            }
            0x20 | 0x28 | 0x30 | 0x38 => {
                let cc = (opcode >> 3) & 3;
                let offset = self.fetch_byte(bus) as i8;
                if self.check_cc(cc) {
                    self.pc = self.pc.wrapping_add(offset as i16 as u16);
                    bus.tick(4);
                }
            }
            0x27 => self.daa(),
            0x2F => {
                self.a = !self.a;
                self.set_flag(FLAG_NEGATIVE, true);
                self.set_flag(FLAG_HALF_CARRY, true);
            }
            0x37 => {
                self.set_flag(FLAG_NEGATIVE, false);
                self.set_flag(FLAG_HALF_CARRY, false);
                self.set_flag(FLAG_CARRY, true);
            }
            0x3F => {
                let carry = self.flag(FLAG_CARRY);
                self.set_flag(FLAG_NEGATIVE, false);
                self.set_flag(FLAG_HALF_CARRY, false);
                self.set_flag(FLAG_CARRY, !carry);
            }
            0x76 => self.halted = true,
            0x40..=0x7F => {
                let dst = (opcode >> 3) & 7;
                let src = opcode & 7;
                let value = self.get_reg(src, bus);
                self.set_reg(dst, value, bus);
            }
            0x80..=0xBF => {
                let op = (opcode >> 3) & 7;
                let value = self.get_reg(opcode & 7, bus);
                self.alu(op, value);
            }
            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                let cc = (opcode >> 3) & 3;
                bus.tick(4);
                if self.check_cc(cc) {
                    self.pc = self.pop16(bus);
                    bus.tick(4);
                }
            }
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop16(bus);
                self.set_rr_stack((opcode >> 4) & 3, value);
            }
            0xC2 | 0xCA | 0xD2 | 0xDA => {
                let cc = (opcode >> 3) & 3;
                let addr = self.fetch_word(bus);
                if self.check_cc(cc) {
                    self.pc = addr;
                    bus.tick(4);
                }
            }
            0xC3 => {
                let addr = self.fetch_word(bus);
                self.pc = addr;
                bus.tick(4);
            }
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                let cc = (opcode >> 3) & 3;
                let addr = self.fetch_word(bus);
                if self.check_cc(cc) {
                    bus.tick(4);
                    let pc = self.pc;
                    self.push16(bus, pc);
                    self.pc = addr;
                }
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                bus.tick(4);
                let value = self.get_rr_stack((opcode >> 4) & 3);
                self.push16(bus, value);
            }
            0xC6 => {
                let value = self.fetch_byte(bus);
                self.alu(0, value);
            }
            0xCE => {
                let value = self.fetch_byte(bus);
                self.alu(1, value);
            }
            0xD6 => {
                let value = self.fetch_byte(bus);
                self.alu(2, value);
            }
            0xDE => {
                let value = self.fetch_byte(bus);
                self.alu(3, value);
            }
            0xE6 => {
                let value = self.fetch_byte(bus);
                self.alu(4, value);
            }
            0xEE => {
                let value = self.fetch_byte(bus);
                self.alu(5, value);
            }
            0xF6 => {
                let value = self.fetch_byte(bus);
                self.alu(6, value);
            }
            0xFE => {
                let value = self.fetch_byte(bus);
                self.alu(7, value);
            }
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                bus.tick(4);
                let pc = self.pc;
                self.push16(bus, pc);
                self.pc = (opcode & 0x38) as u16;
            }
            0xC9 => {
                self.pc = self.pop16(bus);
                bus.tick(4);
            }
            0xD9 => {
                self.pc = self.pop16(bus);
                self.ime = true;
                bus.tick(4);
            }
            0xE9 => self.pc = self.hl(),
            0xF9 => {
                self.sp = self.hl();
                bus.tick(4);
            }
            0xCD => {
                let addr = self.fetch_word(bus);
                bus.tick(4);
                let pc = self.pc;
                self.push16(bus, pc);
                self.pc = addr;
            }
            0xCB => {
                let cb = self.fetch_byte(bus);
                self.execute_cb(cb, bus);
            }
            0xE0 => {
                let offset = self.fetch_byte(bus) as u16;
                bus.write(0xFF00 + offset, self.a);
            }
            0xF0 => {
                let offset = self.fetch_byte(bus) as u16;
                self.a = bus.read(0xFF00 + offset);
            }
            0xE2 => bus.write(0xFF00 + self.c as u16, self.a),
            0xF2 => self.a = bus.read(0xFF00 + self.c as u16),
            0xEA => {
                let addr = self.fetch_word(bus);
                bus.write(addr, self.a);
            }
            0xFA => {
                let addr = self.fetch_word(bus);
                self.a = bus.read(addr);
            }
            0xE8 => {
                let value = self.add_sp_e8(bus);
                self.sp = value;
                bus.tick(8);
            }
            0xF8 => {
                let value = self.add_sp_e8(bus);
                self.set_hl(value);
                bus.tick(4);
            }
            0xF3 => self.ime = false,
            0xFB => self.ime = true,
            0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD => {
                log::debug!("undefined opcode 0x{opcode:02X} at 0x{:04X}; treating as NOP", self.pc.wrapping_sub(1));
            }
        }
    }

    fn execute_cb(&mut self, cb: u8, bus: &mut dyn Bus) {
        let group = (cb >> 6) & 3;
        let n = (cb >> 3) & 7;
        let reg = cb & 7;
        match group {
            0 => {
                let value = self.get_reg(reg, bus);
                let result = self.shift_or_rotate(n, value);
                self.set_flag(FLAG_ZERO, result == 0);
                self.set_flag(FLAG_NEGATIVE, false);
                self.set_flag(FLAG_HALF_CARRY, false);
                self.set_reg(reg, result, bus);
            }
            1 => {
                let value = self.get_reg(reg, bus);
                self.set_flag(FLAG_ZERO, value & (1 << n) == 0);
                self.set_flag(FLAG_NEGATIVE, false);
                self.set_flag(FLAG_HALF_CARRY, true);
            }
            2 => {
                let value = self.get_reg(reg, bus);
                self.set_reg(reg, value & !(1 << n), bus);
            }
            3 => {
                let value = self.get_reg(reg, bus);
                self.set_reg(reg, value | (1 << n), bus);
            }
            _ => unreachable!("group index is masked to 2 bits"),
        }
    }

    /// `n` selects RLC,RRC,RL,RR,SLA,SRA,SWAP,SRL; sets `FLAG_CARRY`, leaves Z/N/H to the
    /// caller (shared with the Z-setting logic that differs between this and RLCA/RRCA/...).
    fn shift_or_rotate(&mut self, n: u8, value: u8) -> u8 {
        match n {
            0 => {
                self.set_flag(FLAG_CARRY, value & 0x80 != 0);
                value.rotate_left(1)
            }
            1 => {
                self.set_flag(FLAG_CARRY, value & 1 != 0);
                value.rotate_right(1)
            }
            2 => {
                let carry_in = self.flag(FLAG_CARRY) as u8;
                self.set_flag(FLAG_CARRY, value & 0x80 != 0);
                (value << 1) | carry_in
            }
            3 => {
                let carry_in = self.flag(FLAG_CARRY) as u8;
                self.set_flag(FLAG_CARRY, value & 1 != 0);
                (value >> 1) | (carry_in << 7)
            }
            4 => {
                self.set_flag(FLAG_CARRY, value & 0x80 != 0);
                value << 1
            }
            5 => {
                self.set_flag(FLAG_CARRY, value & 1 != 0);
                (value >> 1) | (value & 0x80)
            }
            6 => {
                self.set_flag(FLAG_CARRY, false);
                (value << 4) | (value >> 4)
            }
            7 => {
                self.set_flag(FLAG_CARRY, value & 1 != 0);
                value >> 1
            }
            _ => unreachable!("shift/rotate index is masked to 3 bits"),
        }
    }

    fn inc_r(&mut self, idx: u8, bus: &mut dyn Bus) {
        let value = self.get_reg(idx, bus);
        let result = value.wrapping_add(1);
        self.set_flag(FLAG_ZERO, result == 0);
        self.set_flag(FLAG_NEGATIVE, false);
        self.set_flag(FLAG_HALF_CARRY, (value & 0xF) + 1 > 0xF);
        self.set_reg(idx, result, bus);
    }

    fn dec_r(&mut self, idx: u8, bus: &mut dyn Bus) {
        let value = self.get_reg(idx, bus);
        let result = value.wrapping_sub(1);
        self.set_flag(FLAG_ZERO, result == 0);
        self.set_flag(FLAG_NEGATIVE, true);
        self.set_flag(FLAG_HALF_CARRY, value & 0xF == 0);
        self.set_reg(idx, result, bus);
    }

    /// `op` selects ADD,ADC,SUB,SBC,AND,XOR,OR,CP against `self.a`.
    fn alu(&mut self, op: u8, value: u8) {
        match op {
            0 => self.add8(value, false),
            1 => self.add8(value, true),
            2 => self.sub8(value, false),
            3 => self.sub8(value, true),
            4 => self.and8(value),
            5 => self.xor8(value),
            6 => self.or8(value),
            7 => self.cp8(value),
            _ => unreachable!("ALU op index is masked to 3 bits"),
        }
    }

    fn add8(&mut self, value: u8, with_carry: bool) {
        let carry_in = if with_carry && self.flag(FLAG_CARRY) { 1u16 } else { 0 };
        let a = self.a as u16;
        let sum = a + value as u16 + carry_in;
        let half_carry = (a & 0xF) + (value as u16 & 0xF) + carry_in > 0xF;
        self.set_flag(FLAG_ZERO, sum as u8 == 0);
        self.set_flag(FLAG_NEGATIVE, false);
        self.set_flag(FLAG_HALF_CARRY, half_carry);
        self.set_flag(FLAG_CARRY, sum > 0xFF);
        self.a = sum as u8;
    }

    fn sub8(&mut self, value: u8, with_carry: bool) {
        let carry_in = if with_carry && self.flag(FLAG_CARRY) { 1i16 } else { 0 };
        let a = self.a as i16;
        let diff = a - value as i16 - carry_in;
        let half_carry = (a & 0xF) - (value as i16 & 0xF) - carry_in < 0;
        self.set_flag(FLAG_ZERO, diff as u8 == 0);
        self.set_flag(FLAG_NEGATIVE, true);
        self.set_flag(FLAG_HALF_CARRY, half_carry);
        self.set_flag(FLAG_CARRY, diff < 0);
        self.a = diff as u8;
    }

    fn and8(&mut self, value: u8) {
        self.a &= value;
        self.set_flag(FLAG_ZERO, self.a == 0);
        self.set_flag(FLAG_NEGATIVE, false);
        self.set_flag(FLAG_HALF_CARRY, true);
        self.set_flag(FLAG_CARRY, false);
    }

    fn xor8(&mut self, value: u8) {
        self.a ^= value;
        self.set_flag(FLAG_ZERO, self.a == 0);
        self.set_flag(FLAG_NEGATIVE, false);
        self.set_flag(FLAG_HALF_CARRY, false);
        self.set_flag(FLAG_CARRY, false);
    }

    fn or8(&mut self, value: u8) {
        self.a |= value;
        self.set_flag(FLAG_ZERO, self.a == 0);
        self.set_flag(FLAG_NEGATIVE, false);
        self.set_flag(FLAG_HALF_CARRY, false);
        self.set_flag(FLAG_CARRY, false);
    }

    /// CP is SUB without storing the result; run `sub8` for its flags, then restore `a`.
    fn cp8(&mut self, value: u8) {
        let saved = self.a;
        self.sub8(value, false);
        self.a = saved;
    }

    fn add_hl(&mut self, value: u16) {
        let hl = self.hl();
        let (result, carry) = hl.overflowing_add(value);
        let half_carry = (hl & 0xFFF) + (value & 0xFFF) > 0xFFF;
        self.set_hl(result);
        self.set_flag(FLAG_NEGATIVE, false);
        self.set_flag(FLAG_HALF_CARRY, half_carry);
        self.set_flag(FLAG_CARRY, carry);
    }

    fn add_sp_e8(&mut self, bus: &mut dyn Bus) -> u16 {
        let offset = self.fetch_byte(bus) as i8 as i16;
        let result = (self.sp as i16).wrapping_add(offset);
        let half_carry = (self.sp & 0xF) as i16 + (offset & 0xF) > 0xF;
        let carry = (self.sp & 0xFF) as i16 + (offset & 0xFF) > 0xFF;
        self.set_flag(FLAG_ZERO, false);
        self.set_flag(FLAG_NEGATIVE, false);
        self.set_flag(FLAG_HALF_CARRY, half_carry);
        self.set_flag(FLAG_CARRY, carry);
        result as u16
    }

    fn rlca(&mut self) {
        let carry = self.a & 0x80 != 0;
        self.a = self.a.rotate_left(1);
        self.set_flag(FLAG_ZERO, false);
        self.set_flag(FLAG_NEGATIVE, false);
        self.set_flag(FLAG_HALF_CARRY, false);
        self.set_flag(FLAG_CARRY, carry);
    }

    fn rrca(&mut self) {
        let carry = self.a & 1 != 0;
        self.a = self.a.rotate_right(1);
        self.set_flag(FLAG_ZERO, false);
        self.set_flag(FLAG_NEGATIVE, false);
        self.set_flag(FLAG_HALF_CARRY, false);
        self.set_flag(FLAG_CARRY, carry);
    }

    fn rla(&mut self) {
        let carry_in = self.flag(FLAG_CARRY) as u8;
        let carry_out = self.a & 0x80 != 0;
        self.a = (self.a << 1) | carry_in;
        self.set_flag(FLAG_ZERO, false);
        self.set_flag(FLAG_NEGATIVE, false);
        self.set_flag(FLAG_HALF_CARRY, false);
        self.set_flag(FLAG_CARRY, carry_out);
    }

    fn rra(&mut self) {
        let carry_in = self.flag(FLAG_CARRY) as u8;
        let carry_out = self.a & 1 != 0;
        self.a = (self.a >> 1) | (carry_in << 7);
        self.set_flag(FLAG_ZERO, false);
        self.set_flag(FLAG_NEGATIVE, false);
        self.set_flag(FLAG_HALF_CARRY, false);
        self.set_flag(FLAG_CARRY, carry_out);
    }

    /// Binary-coded-decimal adjustment after an 8-bit add/sub, keyed off N/H/C from the
    /// operation that just ran.
    fn daa(&mut self) {
        let mut adjust = 0u8;
        let mut carry = self.flag(FLAG_CARRY);
        if self.flag(FLAG_NEGATIVE) {
            if self.flag(FLAG_HALF_CARRY) {
                adjust |= 0x06;
            }
            if carry {
                adjust |= 0x60;
            }
            self.a = self.a.wrapping_sub(adjust);
        } else {
            if self.flag(FLAG_HALF_CARRY) || self.a & 0x0F > 0x09 {
                adjust |= 0x06;
            }
            if carry || self.a > 0x99 {
                adjust |= 0x60;
                carry = true;
            }
            self.a = self.a.wrapping_add(adjust);
        }
        self.set_flag(FLAG_ZERO, self.a == 0);
        self.set_flag(FLAG_HALF_CARRY, false);
        self.set_flag(FLAG_CARRY, carry);
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
