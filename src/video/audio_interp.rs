//! Frame-rate-locked audio interpolation (spec.md §4.8 step 10): for
//! each video line, compute a sub-sample-accurate audio time cursor
//! from `frame / 29.97` and phase-interpolate the surrounding stereo
//! samples.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StereoSample {
    pub left: i16,
    pub right: i16,
}

pub struct AudioInterpolator {
    audio_sample_rate_hz: f64,
}

impl AudioInterpolator {
    pub fn new(audio_sample_rate_hz: f64) -> Self {
        Self { audio_sample_rate_hz }
    }

    /// Audio cursor position, in input-sample units, for `line_in_frame`
    /// (0-based) of `frame_number` at `fields_per_second` / 2 frame rate.
    fn cursor(&self, frame_number: f64, line_in_frame: usize, lines_per_frame: usize, frame_rate_hz: f64) -> f64 {
        let frac_frame = frame_number + (line_in_frame as f64 / lines_per_frame as f64);
        let seconds = frac_frame / frame_rate_hz;
        seconds * self.audio_sample_rate_hz
    }

    /// Linear-phase-interpolated stereo sample at the computed cursor.
    /// Clamps at the ends of `audio` rather than extrapolating.
    pub fn sample_for_line(
        &self,
        audio: &[StereoSample],
        frame_number: f64,
        line_in_frame: usize,
        lines_per_frame: usize,
        frame_rate_hz: f64,
    ) -> StereoSample {
        if audio.is_empty() {
            return StereoSample { left: 0, right: 0 };
        }
        let pos = self
            .cursor(frame_number, line_in_frame, lines_per_frame, frame_rate_hz)
            .clamp(0.0, (audio.len() - 1) as f64);
        let i0 = pos.floor() as usize;
        let i1 = (i0 + 1).min(audio.len() - 1);
        let frac = pos - i0 as f64;

        let lerp = |a: i16, b: i16| -> i16 {
            (a as f64 + frac * (b as f64 - a as f64)).round() as i16
        };
        StereoSample {
            left: lerp(audio[i0].left, audio[i1].left),
            right: lerp(audio[i0].right, audio[i1].right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_audio_interpolates_to_the_same_constant() {
        let interp = AudioInterpolator::new(48_000.0);
        let audio = vec![StereoSample { left: 1000, right: -1000 }; 200];
        let sample = interp.sample_for_line(&audio, 3.0, 130, 525, 29.97);
        assert_eq!(sample, StereoSample { left: 1000, right: -1000 });
    }

    #[test]
    fn cursor_advances_monotonically_across_a_frame() {
        let interp = AudioInterpolator::new(48_000.0);
        let audio: Vec<StereoSample> = (0..10_000)
            .map(|i| StereoSample { left: i as i16, right: 0 })
            .collect();
        let first = interp.sample_for_line(&audio, 0.0, 0, 525, 29.97);
        let later = interp.sample_for_line(&audio, 0.0, 400, 525, 29.97);
        assert!(later.left >= first.left);
    }

    #[test]
    fn empty_audio_returns_silence() {
        let interp = AudioInterpolator::new(48_000.0);
        let sample = interp.sample_for_line(&[], 0.0, 0, 525, 29.97);
        assert_eq!(sample, StereoSample { left: 0, right: 0 });
    }
}
