//! PPU (Picture Processing Unit) emulation for the Game Boy.
//!
//! Handles the scanline mode FSM (Search/Transfer/HBlank/VBlank), background, window and
//! sprite rendering, OAM priority search, STAT rising-edge interrupts, and the 160x144
//! framebuffer.

pub mod ppu;
