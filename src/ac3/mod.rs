//! AC-3 RF demodulation pipeline (spec.md §5): a 1-bit rolling-average
//! digitizer feeding a QPSK demodulator, a symbol-clock reclocker, a
//! 12-symbol frame sync, 72-frame block assembly, two-pass Reed-Solomon
//! correction, and AC-3 sync-frame validation.
//!
//! Stage chain: samples -> [`adc`] -> [`demodulator`] -> [`reclocker`] ->
//! [`framer`] -> [`blocker`] -> [`corrector`] -> [`syncframe`].

pub mod adc;
pub mod blocker;
pub mod corrector;
pub mod demodulator;
pub mod framer;
pub mod pipeline;
pub mod reclocker;
pub mod syncframe;

pub use pipeline::{Ac3Output, Pipeline};
