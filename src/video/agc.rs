//! IRE-to-sample mapping and optional auto-ranging (AGC).
//!
//! spec.md §4.8 step 1 and §9's open question: the range-checked fixed
//! mapping is the one validated against known-good captures, so
//! [`VideoConfig::auto_range`] defaults to `false` and [`AutoRanger`]
//! exists for the flagged-optional path rather than as the default.

use crate::config::VideoConfig;

/// Sample-amplitude-to-IRE mapping. `zero_sample` is the sample value
/// at 0 IRE (blanking level); `scale` is samples per IRE unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IreScale {
    pub zero_sample: f64,
    pub scale: f64,
}

impl IreScale {
    /// Fixed mapping for a full-scale signed-16-bit composite capture:
    /// blanking at sample 0, white (100 IRE) at 3/4 of full scale, sync
    /// tip (-40 IRE) proportionally below blanking.
    pub fn fixed() -> Self {
        Self {
            zero_sample: 0.0,
            scale: (i16::MAX as f64 * 0.75) / 100.0,
        }
    }

    pub fn sample_to_ire(&self, sample: i16) -> f64 {
        self.sample_to_ire_f64(sample as f64)
    }

    /// Same mapping, for samples already in floating-point form (e.g.
    /// bicubic-resampled output that hasn't been rounded back to `i16`).
    pub fn sample_to_ire_f64(&self, sample: f64) -> f64 {
        (sample - self.zero_sample) / self.scale
    }

    pub fn ire_to_sample(&self, ire: f64) -> f64 {
        ire * self.scale + self.zero_sample
    }
}

impl Default for IreScale {
    fn default() -> Self {
        Self::fixed()
    }
}

/// Long low-pass estimate of sync-tip (minimum) and peak-white
/// (maximum) levels, producing a dynamic [`IreScale`]. Disabled by
/// default (`VideoConfig::auto_range`); the source notes `findVsync`/
/// `findSync` have out-of-bounds behavior when auto-ranging is active,
/// so conforming callers clamp `start_pos` to `>= 0` when they use it.
pub struct AutoRanger {
    /// Exponential-moving-average time constant, in samples.
    time_constant: f64,
    min_estimate: f64,
    max_estimate: f64,
    seeded: bool,
}

impl AutoRanger {
    pub fn new(time_constant_samples: f64) -> Self {
        Self {
            time_constant: time_constant_samples.max(1.0),
            min_estimate: 0.0,
            max_estimate: 0.0,
            seeded: false,
        }
    }

    pub fn for_config(config: &VideoConfig) -> Self {
        // One field's worth of samples gives the long filter enough
        // history to ignore line-to-line noise.
        Self::new(config.samples_per_field())
    }

    /// Update the running min/max estimate with a chunk of samples and
    /// return the resulting [`IreScale`]. 100 IRE (white) is assumed to
    /// sit 140/40 above the sync-tip-to-blanking span, per the -40..100
    /// IRE convention (spec.md GLOSSARY).
    pub fn process(&mut self, samples: &[i16]) -> IreScale {
        let alpha = 1.0 / self.time_constant;
        for &s in samples {
            let v = s as f64;
            if !self.seeded {
                self.min_estimate = v;
                self.max_estimate = v;
                self.seeded = true;
                continue;
            }
            if v < self.min_estimate {
                self.min_estimate += alpha * (v - self.min_estimate) * 8.0;
            } else {
                self.min_estimate += alpha * (v - self.min_estimate);
            }
            if v > self.max_estimate {
                self.max_estimate += alpha * (v - self.max_estimate) * 8.0;
            } else {
                self.max_estimate += alpha * (v - self.max_estimate);
            }
        }
        let span = (self.max_estimate - self.min_estimate).max(1.0);
        // sync tip (-40 IRE) .. white (100 IRE) spans 140 IRE units.
        let scale = span / 140.0;
        IreScale {
            zero_sample: self.min_estimate + 40.0 * scale,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_scale_round_trips_blanking_and_white() {
        let scale = IreScale::fixed();
        assert!((scale.sample_to_ire(0) - 0.0).abs() < 1e-9);
        let white_sample = scale.ire_to_sample(100.0).round() as i16;
        assert!((scale.sample_to_ire(white_sample) - 100.0).abs() < 0.01);
    }

    #[test]
    fn autoranger_converges_on_constant_square_wave() {
        let mut agc = AutoRanger::new(200.0);
        let samples: Vec<i16> = (0..20_000)
            .map(|i| if i % 100 < 10 { -10_000 } else { 20_000 })
            .collect();
        let scale = agc.process(&samples);
        assert!(scale.scale > 0.0);
        // Mid-level samples should land near the middle of the IRE band.
        let mid_ire = scale.sample_to_ire(5_000);
        assert!(mid_ire > -40.0 && mid_ire < 140.0);
    }
}
