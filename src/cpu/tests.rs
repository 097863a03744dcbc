use crate::bus::test_support::TestBus;
use crate::cpu::cpu::Cpu;
use crate::cpu::flags::{FLAG_CARRY, FLAG_HALF_CARRY, FLAG_NEGATIVE, FLAG_ZERO};

fn run(program: &[u8]) -> (Cpu, TestBus) {
    let mut bus = TestBus::new();
    bus.mem[..program.len()].copy_from_slice(program);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    (cpu, bus)
}

#[test]
fn ld_bc_d16_loads_immediate_pair() {
    let (cpu, _) = run(&[0x01, 0x34, 0x12]); // LD BC,0x1234
    assert_eq!(cpu.bc(), 0x1234);
    assert_eq!(cpu.pc, 3);
}

#[test]
fn ld_a_d8_then_add_b_sets_carry_and_zero() {
    let mut bus = TestBus::new();
    // LD A,0xFF ; LD B,0x01 ; ADD A,B
    bus.mem[0..6].copy_from_slice(&[0x3E, 0xFF, 0x06, 0x01, 0x80, 0x00]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0);
    assert_ne!(cpu.f & FLAG_ZERO, 0);
    assert_ne!(cpu.f & FLAG_CARRY, 0);
    assert_eq!(cpu.f & FLAG_NEGATIVE, 0);
}

#[test]
fn sub_sets_negative_and_half_carry_on_nibble_borrow() {
    let mut bus = TestBus::new();
    // LD A,0x10 ; LD B,0x01 ; SUB B
    bus.mem[0..5].copy_from_slice(&[0x3E, 0x10, 0x06, 0x01, 0x90]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x0F);
    assert_ne!(cpu.f & FLAG_NEGATIVE, 0);
    assert_ne!(cpu.f & FLAG_HALF_CARRY, 0);
}

#[test]
fn inc_hl_indirect_round_trips_through_bus() {
    let mut bus = TestBus::new();
    bus.mem[0x9000] = 0x41;
    // LD HL,0x9000 ; INC (HL)
    bus.mem[0..4].copy_from_slice(&[0x21, 0x00, 0x90, 0x34]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(bus.mem[0x9000], 0x42);
}

#[test]
fn push_pop_round_trips_register_pair() {
    let mut bus = TestBus::new();
    // LD SP,0xFFFE ; LD BC,0xBEEF ; PUSH BC ; LD BC,0 ; POP BC
    bus.mem[0..9].copy_from_slice(&[0x31, 0xFE, 0xFF, 0x01, 0xEF, 0xBE, 0xC5, 0x01, 0x00]);
    bus.mem[9] = 0x00;
    bus.mem[10] = 0xC1;
    let mut cpu = Cpu::new();
    for _ in 0..5 {
        cpu.step(&mut bus);
    }
    assert_eq!(cpu.bc(), 0xBEEF);
    assert_eq!(cpu.sp, 0xFFFE);
}

#[test]
fn conditional_jr_not_taken_falls_through() {
    let mut bus = TestBus::new();
    // XOR A (Z=1) ; JR NZ,+10 ; INC A
    bus.mem[0..4].copy_from_slice(&[0xAF, 0x20, 0x0A, 0x3C]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 3);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 1);
}

#[test]
fn call_then_ret_restores_pc() {
    let mut bus = TestBus::new();
    // LD SP,0xFFFE ; CALL 0x0010 ; (at 0x10) RET
    bus.mem[0..6].copy_from_slice(&[0x31, 0xFE, 0xFF, 0xCD, 0x10, 0x00]);
    bus.mem[0x10] = 0xC9;
    let mut cpu = Cpu::new();
    cpu.step(&mut bus); // LD SP
    cpu.step(&mut bus); // CALL
    assert_eq!(cpu.pc, 0x10);
    cpu.step(&mut bus); // RET
    assert_eq!(cpu.pc, 6);
}

#[test]
fn halt_opcode_sets_halted_flag() {
    let (cpu, _) = run(&[0x76]);
    assert!(cpu.halted);
}

#[test]
fn cb_bit_seven_on_zero_sets_zero_flag() {
    let mut bus = TestBus::new();
    // XOR A ; BIT 7,A
    bus.mem[0..3].copy_from_slice(&[0xAF, 0xCB, 0x7F]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_ne!(cpu.f & FLAG_ZERO, 0);
}

#[test]
fn cb_res_clears_only_targeted_bit() {
    let mut bus = TestBus::new();
    // LD A,0xFF ; RES 3,A
    bus.mem[0..4].copy_from_slice(&[0x3E, 0xFF, 0xCB, 0x9F]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0xF7);
}

#[test]
fn cb_swap_exchanges_nibbles() {
    let mut bus = TestBus::new();
    // LD A,0x12 ; SWAP A
    bus.mem[0..4].copy_from_slice(&[0x3E, 0x12, 0xCB, 0x37]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x21);
}

#[test]
fn daa_corrects_bcd_addition() {
    let mut bus = TestBus::new();
    // LD A,0x09 ; LD B,0x01 ; ADD A,B ; DAA
    bus.mem[0..6].copy_from_slice(&[0x3E, 0x09, 0x06, 0x01, 0x80, 0x27]);
    let mut cpu = Cpu::new();
    for _ in 0..4 {
        cpu.step(&mut bus);
    }
    assert_eq!(cpu.a, 0x10);
}

#[test]
fn ei_takes_effect_immediately() {
    let (cpu, _) = run(&[0xFB]);
    assert!(cpu.ime);
}

#[test]
fn di_clears_ime() {
    let mut bus = TestBus::new();
    bus.mem[0..2].copy_from_slice(&[0xFB, 0xF3]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert!(!cpu.ime);
}
