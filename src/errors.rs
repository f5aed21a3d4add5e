//! Error taxonomy for the capture decoder.
//!
//! Most abnormal conditions are *not* represented here: locally
//! recoverable drift (PLL period adjustment, single-symbol CIRC
//! correction, single-line HSYNC interpolation) is absorbed silently
//! and only surfaces through a stage's `Statistics`. Locally marked
//! conditions (uncorrectable C1/C2, dropout pixels) are flags carried
//! on the emitted item. Only stream-resync exhaustion and structurally
//! invalid input reach `Err` here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("EFM error: {0}")]
    Efm(#[from] EfmError),

    #[error("AC-3 error: {0}")]
    Ac3(#[from] Ac3Error),

    #[error("video error: {0}")]
    Video(#[from] VideoError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum EfmError {
    #[error("subcode section sync lost after {attempts} recovery attempts")]
    SectionSyncLost { attempts: u32 },

    #[error("F3 frame buffer underrun: need {required} frames, have {available}")]
    InsufficientF3Frames { required: usize, available: usize },

    #[error("CIRC decode produced fewer symbols than requested: expected {expected}, got {actual}")]
    CircShortOutput { expected: usize, actual: usize },

    #[error("F1 frame has invalid mode byte: {mode:#04x}")]
    InvalidSectorMode { mode: u8 },

    #[error("PLL period adjustment diverged: period {period} outside [{min}, {max}]")]
    PllDiverged { period: f64, min: f64, max: f64 },
}

#[derive(Debug, Error)]
pub enum Ac3Error {
    #[error("unsupported AC-3 frame size: frmsizecod={frmsizecod}, fscod={fscod} (only frmsizecod=28, fscod=0 supported)")]
    UnsupportedFrameSize { frmsizecod: u8, fscod: u8 },

    #[error("QPSK frame sync not found after {symbols_searched} symbols")]
    SyncNotFound { symbols_searched: usize },

    #[error("block assembly incomplete: expected {expected} frames, got {actual}")]
    IncompleteBlock { expected: usize, actual: usize },

    #[error("sync-frame CRC mismatch: expected {expected:#06x}, got {actual:#06x}")]
    CrcMismatch { expected: u16, actual: u16 },

    #[error("Reed-Solomon corrector exhausted: {erasures} erasures exceed correction capacity {capacity}")]
    RsUncorrectable { erasures: usize, capacity: usize },
}

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("VSYNC not found within {lines_searched} lines")]
    VsyncNotFound { lines_searched: usize },

    #[error("burst-phase lock failed: correlation {correlation} below threshold {threshold}")]
    BurstLockFailed { correlation: f64, threshold: f64 },

    #[error("invalid video geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("VBI Manchester decode failed: {reason}")]
    VbiDecodeFailed { reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sample rate: {rate} Hz (must be > 0)")]
    InvalidSampleRate { rate: f64 },

    #[error("invalid channel count: {count}")]
    InvalidChannelCount { count: usize },

    #[error("invalid video standard parameters: {reason}")]
    InvalidVideoStandard { reason: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
