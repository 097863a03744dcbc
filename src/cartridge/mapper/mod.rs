//! Cartridge memory bank controllers (MBCs).
//!
//! - [`NoMbc`]: fixed ROM, no banking, no SRAM.
//! - [`Mbc3`]: switchable ROM/RAM banks with a persistent battery file.
//!
//! Selected from the cartridge header byte at 0x147, same dispatch point as the reference
//! `GameBoy::LoadGame`. See [Pan Docs MBCs](https://gbdev.io/pandocs/MBCs.html).

pub mod mbc3;
pub mod no_mbc;

/// Capability set shared by every mapper: ROM/RAM read-write, plus the bank a host-side
/// debugger might want to display. `rom1_bank` has no use inside the core today; kept per
/// the reference `MBCBase::GetROM1Bank` interface.
pub trait Mapper {
    fn read(&self, address: u16) -> u8;
    fn write(&mut self, address: u16, value: u8);

    fn rom1_bank(&self) -> u8 {
        1
    }
}

pub use mbc3::Mbc3;
pub use no_mbc::NoMbc;
