//! DIV/TIMA timer: a free-running 256-cycle divider plus a rate-selectable counter that
//! raises [`Interrupt::Timer`](crate::irq::Interrupt::Timer) on overflow.
//!
//! See [Pan Docs timer](https://gbdev.io/pandocs/Timer_and_Divider_Registers.html). Ported
//! from the reference `Timer` class: DIV reschedules itself forever from reset; TIMA only
//! reschedules while enabled, and a TAC write can retarget or cancel it mid-flight.

use crate::irq::{Interrupt, Irq};
use crate::scheduler::{EventHandle, EventKind, Scheduler};

pub const REG_DIV: u8 = 0x04;
pub const REG_TIMA: u8 = 0x05;
pub const REG_TMA: u8 = 0x06;
pub const REG_TAC: u8 = 0x07;

/// TAC clock-select duty cycles in T-cycles, indexed by the 2-bit clock_select field.
const TIMER_DUTY: [u64; 4] = [1024, 16, 64, 256];

pub struct Timer {
    div: u8,
    tima: u8,
    tma: u8,
    tac_enabled: bool,
    tac_clock_select: u8,
    timer_event: Option<EventHandle>,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            div: 255,
            tima: 0,
            tma: 0,
            tac_enabled: false,
            tac_clock_select: 0,
            timer_event: None,
        }
    }

    pub fn reset(&mut self, scheduler: &mut Scheduler) {
        self.div = 255;
        self.tima = 0;
        self.tma = 0;
        self.tac_enabled = false;
        self.tac_clock_select = 0;
        self.timer_event = None;
        self.step_div(scheduler, 0);
    }

    /// Self-perpetuating: reschedules itself every call regardless of TAC.
    pub fn step_div(&mut self, scheduler: &mut Scheduler, cycles_late: u64) {
        self.div = self.div.wrapping_add(1);
        scheduler.add(256 - cycles_late, EventKind::TimerDiv);
    }

    pub fn step_tima(&mut self, scheduler: &mut Scheduler, irq: &mut Irq, cycles_late: u64) {
        if self.tima == 255 {
            self.tima = self.tma;
            irq.raise(Interrupt::Timer);
        } else {
            self.tima += 1;
        }
        if self.tac_enabled {
            self.schedule_timer(scheduler, cycles_late);
        }
    }

    fn schedule_timer(&mut self, scheduler: &mut Scheduler, cycles_late: u64) {
        let cycles = TIMER_DUTY[self.tac_clock_select as usize] - cycles_late;
        self.timer_event = Some(scheduler.add(cycles, EventKind::TimerTima));
    }

    pub fn read_mmio(&self, reg: u8) -> u8 {
        match reg {
            REG_DIV => self.div,
            REG_TIMA => self.tima,
            REG_TMA => self.tma,
            REG_TAC => self.tac_clock_select | if self.tac_enabled { 4 } else { 0 },
            _ => 0,
        }
    }

    pub fn write_mmio(&mut self, scheduler: &mut Scheduler, reg: u8, value: u8) {
        match reg {
            REG_DIV => self.div = 0,
            REG_TIMA => self.tima = value,
            REG_TMA => self.tma = value,
            REG_TAC => {
                let enabled_old = self.tac_enabled;
                let clock_select_old = self.tac_clock_select;
                self.tac_clock_select = value & 3;
                self.tac_enabled = value & 4 != 0;

                if self.tac_clock_select != clock_select_old && enabled_old && self.tac_enabled {
                    if let Some(h) = self.timer_event.take() {
                        scheduler.cancel(h);
                    }
                    self.schedule_timer(scheduler, 0);
                }
                if !enabled_old && self.tac_enabled {
                    self.tima = self.tma;
                    self.schedule_timer(scheduler, 0);
                } else if enabled_old && !self.tac_enabled {
                    if let Some(h) = self.timer_event.take() {
                        scheduler.cancel(h);
                    }
                }
            }
            _ => {}
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tima_overflow_reloads_and_raises_irq() {
        let mut scheduler = Scheduler::new();
        let mut irq = Irq::new();
        let mut timer = Timer::new();
        timer.write_mmio(&mut scheduler, REG_TMA, 0x10);
        timer.tima = 255;
        timer.step_tima(&mut scheduler, &mut irq, 0);
        assert_eq!(timer.tima, 0x10);
        assert_eq!(irq.read_mmio(crate::irq::REG_IF) & Interrupt::Timer as u8, Interrupt::Timer as u8);
    }

    #[test]
    fn div_write_resets_to_zero() {
        let mut scheduler = Scheduler::new();
        let mut timer = Timer::new();
        timer.div = 123;
        timer.write_mmio(&mut scheduler, REG_DIV, 0xFF);
        assert_eq!(timer.read_mmio(REG_DIV), 0);
    }

    #[test]
    fn enabling_tac_reloads_tima_from_tma_immediately() {
        let mut scheduler = Scheduler::new();
        let mut timer = Timer::new();
        timer.write_mmio(&mut scheduler, REG_TMA, 0x42);
        timer.tima = 0x00;
        timer.write_mmio(&mut scheduler, REG_TAC, 0b100);
        assert_eq!(timer.tima, 0x42);
        assert!(timer.timer_event.is_some());
    }
}
