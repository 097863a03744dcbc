//! Game Boy APU (Audio Processing Unit) emulation.
//!
//! - **Quad** (x2): square waves with duty, envelope, and (channel 1 only) frequency sweep.
//! - **Wave**: 32 4-bit samples played back from wave RAM at a programmable rate.
//! - **Noise**: 15-bit LFSR, optionally narrowed to a 7-bit period, with envelope.
//! - **Sequencer**: shared envelope/sweep/length units clocked by the 512 Hz frame sequencer.
//! - **Mixer**: averages all four channels, downsamples to 65,536 Hz, then resamples to the
//!   host's output rate through a windowed-sinc filter into a ring buffer rodio pulls from.

pub mod apu;
mod channel_noise;
mod channel_quad;
mod channel_wave;
mod resampler;
mod ring_buffer;
mod sequencer;
