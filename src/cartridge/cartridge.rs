//! Game Boy cartridge loading: size validation, then mapper dispatch by the header byte at
//! 0x147. Ported from the reference `GameBoy::LoadGame`; the original's success-regardless
//! "bad or unknown mapper" fallthrough is promoted to an actual error here (see `DESIGN.md`).

use std::path::Path;

use crate::cartridge::mapper::{Mapper, Mbc3, NoMbc};
use crate::error::EmulatorError;

/// Header offset of the cartridge-type byte that selects a mapper.
const HEADER_CARTRIDGE_TYPE: usize = 0x147;

pub struct Cartridge {
    pub mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Validate `data` per `SPEC_FULL.md` §4.7 and construct the mapper it selects.
    /// `save_path` is only opened for battery-backed mappers (MBC3).
    pub fn load(data: Vec<u8>, save_path: &Path) -> Result<Self, EmulatorError> {
        if data.is_empty() {
            return Err(EmulatorError::EmptyRom);
        }
        if data.len() & 0x3FFF != 0 {
            return Err(EmulatorError::RomSizeNotAligned(data.len()));
        }
        if (data.len() >> 14) > 256 {
            return Err(EmulatorError::RomTooLarge(data.len()));
        }

        let cartridge_type = data[HEADER_CARTRIDGE_TYPE];
        let mapper: Box<dyn Mapper> = match cartridge_type {
            0x00 | 0x08 | 0x09 => Box::new(NoMbc::new(data)),
            0x01 | 0x03 => {
                log::warn!("cartridge type 0x{cartridge_type:02X} is MBC1; approximating as MBC3");
                Box::new(Mbc3::new(data, save_path)?)
            }
            0x0F..=0x13 => Box::new(Mbc3::new(data, save_path)?),
            other => return Err(EmulatorError::UnknownMapper(other)),
        };

        Ok(Self { mapper })
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.mapper.read(addr)
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        self.mapper.write(addr, data);
    }

    pub fn rom1_bank(&self) -> u8 {
        self.mapper.rom1_bank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn rom_of(size: usize, cartridge_type: u8) -> Vec<u8> {
        let mut data = vec![0u8; size];
        if size > HEADER_CARTRIDGE_TYPE {
            data[HEADER_CARTRIDGE_TYPE] = cartridge_type;
        }
        data
    }

    #[test]
    fn empty_rom_is_rejected() {
        let err = Cartridge::load(Vec::new(), &PathBuf::from("/dev/null"));
        assert!(matches!(err, Err(EmulatorError::EmptyRom)));
    }

    #[test]
    fn unaligned_size_is_rejected() {
        let err = Cartridge::load(vec![0u8; 100], &PathBuf::from("/dev/null"));
        assert!(matches!(err, Err(EmulatorError::RomSizeNotAligned(100))));
    }

    #[test]
    fn no_mbc_header_selects_no_mbc() {
        let data = rom_of(0x4000, 0x00);
        let cart = Cartridge::load(data, &PathBuf::from("/dev/null")).unwrap();
        assert_eq!(cart.rom1_bank(), 1);
    }

    #[test]
    fn unknown_mapper_byte_is_rejected() {
        let data = rom_of(0x4000, 0xFE);
        let err = Cartridge::load(data, &PathBuf::from("/dev/null"));
        assert!(matches!(err, Err(EmulatorError::UnknownMapper(0xFE))));
    }
}
