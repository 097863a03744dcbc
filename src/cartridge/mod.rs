//! Game Boy cartridge loading and mapper support.
//!
//! - **cartridge**: validates raw ROM bytes, dispatches a [`mapper::Mapper`] by header byte.
//! - **mapper**: [`mapper::NoMbc`], [`mapper::Mbc3`] for ROM/RAM bank switching and battery save.

pub mod cartridge;
pub mod mapper;

pub use cartridge::Cartridge;
