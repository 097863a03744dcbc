//! Structured configuration errors surfaced by [`crate::emulator::Emulator`]'s load paths.
//!
//! Runtime conditions that the reference implementation merely logs (unhandled MMIO,
//! out-of-range reads) stay as `log` calls per `SPEC_FULL.md` §7 — they are not promoted to
//! `Result` here, only the handful of conditions that should stop a load outright.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("boot ROM must be exactly 256 (DMG) or 2304 (CGB) bytes, got {0}")]
    BadBootRomSize(usize),

    #[error("cartridge ROM may not be empty")]
    EmptyRom,

    #[error("cartridge ROM size must be a multiple of 16 KiB, got {0}")]
    RomSizeNotAligned(usize),

    #[error("cartridge ROM may not be larger than 4 MiB, got {0} bytes")]
    RomTooLarge(usize),

    #[error("unknown or unsupported mapper byte 0x{0:02X} at cartridge header offset 0x147")]
    UnknownMapper(u8),

    #[error("failed to open battery save file {path}: {source}")]
    SaveFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
