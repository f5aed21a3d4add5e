//! Configuration types shared across the EFM, AC-3, and video pipelines.
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, Result};

/// Bit layout of the raw RF capture.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 16-bit samples, used for LaserDisc video/EFM RF captures.
    #[default]
    Signed16,
    /// Unsigned 8-bit samples, used for 1-bit-ADC AC-3 RF captures.
    Unsigned8,
}

/// Common capture parameters, shared by all three pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub sample_rate_hz: f64,
    pub format: SampleFormat,
    pub channels: usize,
}

impl CaptureConfig {
    /// 28.8 MSPS preset used for unmodulated composite LaserDisc RF captures.
    pub fn laserdisc_288() -> Self {
        Self {
            sample_rate_hz: 28_800_000.0,
            format: SampleFormat::Signed16,
            channels: 1,
        }
    }

    /// 40 MSPS preset used for EFM/CD-style RF captures.
    pub fn efm_40() -> Self {
        Self {
            sample_rate_hz: 40_000_000.0,
            format: SampleFormat::Signed16,
            channels: 1,
        }
    }

    /// 46.08 MSPS preset used for AC-3 RF captures (1-bit ADC).
    pub fn ac3_4608() -> Self {
        Self {
            sample_rate_hz: 46_080_000.0,
            format: SampleFormat::Unsigned8,
            channels: 1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(ConfigError::InvalidSampleRate {
                rate: self.sample_rate_hz,
            }
            .into());
        }
        if self.channels == 0 {
            return Err(ConfigError::InvalidChannelCount {
                count: self.channels,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::efm_40()
    }
}

/// How the F1-to-audio stage treats an uncorrectable CIRC frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum AudioErrorTreatment {
    /// Replace the bad frame with digital silence.
    Silence,
    /// Emit the undecoded bytes unchanged.
    PassThrough,
    #[default]
    Conceal,
}

/// Interpolation strategy used when `AudioErrorTreatment::Conceal` is selected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum ConcealmentKind {
    /// Linear interpolation between the last good sample and the next good sample.
    #[default]
    Linear,
    /// Second-order predictive extrapolation from the two preceding good samples.
    Predictive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfmConfig {
    pub capture: CaptureConfig,
    /// Nominal EFM channel bit rate in bit/s (4.3218 Mbit/s for CD/LaserDisc digital audio).
    pub channel_bit_rate_hz: f64,
    pub audio_error_treatment: AudioErrorTreatment,
    pub concealment: ConcealmentKind,
    /// Consecutive section-sync misses tolerated before declaring sync lost.
    pub max_sync_recovery_attempts: u32,
}

impl Default for EfmConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::efm_40(),
            channel_bit_rate_hz: 4_321_800.0,
            audio_error_treatment: AudioErrorTreatment::default(),
            concealment: ConcealmentKind::default(),
            max_sync_recovery_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ac3Config {
    pub capture: CaptureConfig,
    /// Nominal QPSK symbol rate in symbols/s.
    pub symbol_rate_hz: f64,
    /// Only frmsizecod=28 (768 words/frame) and fscod=0 (48 kHz) are supported.
    pub frmsizecod: u8,
    pub fscod: u8,
}

impl Default for Ac3Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::ac3_4608(),
            symbol_rate_hz: 1_536_000.0,
            frmsizecod: 28,
            fscod: 0,
        }
    }
}

impl Ac3Config {
    pub fn validate(&self) -> Result<()> {
        self.capture.validate()?;
        if self.frmsizecod != 28 || self.fscod != 0 {
            return Err(crate::errors::Ac3Error::UnsupportedFrameSize {
                frmsizecod: self.frmsizecod,
                fscod: self.fscod,
            }
            .into());
        }
        Ok(())
    }
}

/// Analog video line/field geometry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VideoStandard {
    Ntsc,
    Pal,
}

impl VideoStandard {
    pub fn lines_per_field(self) -> usize {
        match self {
            VideoStandard::Ntsc => 262,
            VideoStandard::Pal => 312,
        }
    }

    pub fn fields_per_second(self) -> f64 {
        match self {
            VideoStandard::Ntsc => 59.94,
            VideoStandard::Pal => 50.0,
        }
    }

    /// Horizontal line rate in Hz (spec.md §4.8 HSYNC spacing).
    pub fn line_frequency_hz(self) -> f64 {
        match self {
            VideoStandard::Ntsc => 15_734.264,
            VideoStandard::Pal => 15_625.0,
        }
    }

    /// Output samples per resampled active line (spec.md §4.8 step 7).
    pub fn output_line_width(self) -> usize {
        match self {
            VideoStandard::Ntsc => 910,
            VideoStandard::Pal => 1135,
        }
    }

    /// NTSC resampling applies a fixed 33-degree colorburst phase shift;
    /// PAL's alternating burst phase needs none here.
    pub fn resample_phase_shift_degrees(self) -> f64 {
        match self {
            VideoStandard::Ntsc => 33.0,
            VideoStandard::Pal => 0.0,
        }
    }

    /// Output rows per frame (two interlaced fields plus the sync rows
    /// spec.md §4.8 "Frame assembly" reserves at the top).
    pub fn output_rows_per_frame(self) -> usize {
        3 + 2 * self.lines_per_field()
    }

    /// VBI lines carrying the three Manchester-coded 24-bit words.
    pub fn vbi_lines(self) -> [usize; 3] {
        [16, 17, 18]
    }

    /// Colorburst frequency in Hz.
    pub fn burst_frequency_hz(self) -> f64 {
        match self {
            VideoStandard::Ntsc => 315.0 / 88.0 * 1_000_000.0,
            VideoStandard::Pal => 4_433_618.75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    pub capture: CaptureConfig,
    pub standard: VideoStandard,
    /// Auto-ranging (AGC) is disabled by default; the fixed-range path is
    /// the one validated against known-good captures.
    pub auto_range: bool,
    /// Minimum colorburst correlation to declare burst-phase lock.
    pub burst_lock_threshold: f64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::laserdisc_288(),
            standard: VideoStandard::Ntsc,
            auto_range: false,
            burst_lock_threshold: 0.6,
        }
    }
}

impl VideoConfig {
    /// Nominal input samples per video line at this capture's sample rate.
    pub fn samples_per_line(&self) -> f64 {
        self.capture.sample_rate_hz / self.standard.line_frequency_hz()
    }

    /// Nominal input samples per video field.
    pub fn samples_per_field(&self) -> f64 {
        self.samples_per_line() * self.standard.lines_per_field() as f64
    }

    /// Input samples per one cycle of the colorburst subcarrier.
    pub fn samples_per_burst_cycle(&self) -> f64 {
        self.capture.sample_rate_hz / self.standard.burst_frequency_hz()
    }

    pub fn validate(&self) -> Result<()> {
        self.capture.validate()?;
        if self.burst_lock_threshold <= 0.0 || self.burst_lock_threshold > 1.0 {
            return Err(ConfigError::InvalidVideoStandard {
                reason: format!(
                    "burst_lock_threshold {} out of range (0, 1]",
                    self.burst_lock_threshold
                ),
            }
            .into());
        }
        Ok(())
    }
}
