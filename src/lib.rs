//! Core decoding library for RF captures of LaserDisc and CD media.
//!
//! Three streaming pipelines share this crate: [`efm`] (EFM channel
//! decode: RF samples to CD-DA audio or data sectors), [`ac3`] (AC-3
//! RF demodulation for LaserDisc digital audio), and [`video`] (video
//! time-base correction, including VBI line demodulation). Each
//! pipeline is a chain of single-purpose stage modules wired together
//! by a `Pipeline` type exposing `feed`/`statistics`; [`vbi`] and
//! [`metadata`] turn the video pipeline's raw VBI codes into
//! structured navigation and per-field metadata. [`config`] holds the
//! serde-derived configuration surface, [`errors`] the error
//! taxonomy, [`logging`] the structured event log, and
//! [`worker_pool`] the generic frame-parallel harness contract
//! (spec.md §5) that an external driver uses for per-line fan-out.

pub mod ac3;
pub mod config;
pub mod efm;
pub mod errors;
pub mod logging;
pub mod metadata;
pub mod rs_engine;
pub mod utils;
pub mod vbi;
pub mod video;
pub mod worker_pool;

pub use config::{Ac3Config, CaptureConfig, EfmConfig, VideoConfig};
pub use errors::{CoreError, Result};
