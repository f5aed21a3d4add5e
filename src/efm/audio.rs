//! F1-to-audio converter (spec.md §4.6): turns F1 frames (6 interleaved
//! stereo 16-bit samples each) into a PCM byte stream, applying the
//! configured error treatment and concealment strategy to corrupt or
//! missing frames.

use crate::config::{AudioErrorTreatment, ConcealmentKind};
use crate::efm::f1::F1Frame;

const SAMPLES_PER_FRAME: usize = 6;
const BYTES_PER_FRAME: usize = 24;
/// Predictive concealment keeps the original sample whenever it's
/// within this many 16-bit units of the linear interpolation.
const PREDICTIVE_THRESHOLD: i32 = 1024;

#[derive(Debug, Default, Clone, Copy)]
pub struct Statistics {
    pub audio_samples: u64,
    pub corrupt_samples: u64,
    pub missing_samples: u64,
    pub concealed_samples: u64,
    pub total_samples: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StereoSample {
    left: i16,
    right: i16,
}

fn frame_to_samples(data: &[u8; 24]) -> [StereoSample; SAMPLES_PER_FRAME] {
    std::array::from_fn(|i| StereoSample {
        left: i16::from_le_bytes([data[i * 4], data[i * 4 + 1]]),
        right: i16::from_le_bytes([data[i * 4 + 2], data[i * 4 + 3]]),
    })
}

fn samples_to_bytes(samples: &[StereoSample]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        out.extend_from_slice(&s.left.to_le_bytes());
        out.extend_from_slice(&s.right.to_le_bytes());
    }
    out
}

/// Whether an F1 frame should be treated as unusable for direct audio
/// emission. A simultaneous corrupt+missing frame is treated as
/// missing (spec.md §8 boundary behavior): it is never pass-through'd.
fn is_bad(frame: &F1Frame) -> bool {
    frame.corrupt || frame.missing
}

pub struct F1ToAudio {
    treatment: AudioErrorTreatment,
    concealment: ConcealmentKind,
    stats: Statistics,
}

impl F1ToAudio {
    pub fn new(treatment: AudioErrorTreatment, concealment: ConcealmentKind) -> Self {
        Self {
            treatment,
            concealment,
            stats: Statistics::default(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    /// Converts a run of F1 frames to PCM bytes. `frames.len() * 24`
    /// bytes are always emitted (spec.md P4), regardless of treatment.
    pub fn process(&mut self, frames: &[F1Frame]) -> Vec<u8> {
        // Flatten to a per-sample-group view with good/bad tags so
        // concealment can see across frame boundaries.
        let groups: Vec<([StereoSample; SAMPLES_PER_FRAME], bool)> = frames
            .iter()
            .map(|f| (frame_to_samples(&f.data), is_bad(f)))
            .collect();

        for (_, bad) in &groups {
            self.stats.total_samples += SAMPLES_PER_FRAME as u64;
            if *bad {
                self.stats.missing_samples += SAMPLES_PER_FRAME as u64;
            } else {
                self.stats.audio_samples += SAMPLES_PER_FRAME as u64;
            }
        }

        let mut output = vec![StereoSample { left: 0, right: 0 }; groups.len() * SAMPLES_PER_FRAME];

        match self.treatment {
            AudioErrorTreatment::Silence => {
                for (i, (samples, bad)) in groups.iter().enumerate() {
                    for (j, s) in samples.iter().enumerate() {
                        output[i * SAMPLES_PER_FRAME + j] =
                            if *bad { StereoSample { left: 0, right: 0 } } else { *s };
                    }
                }
            }
            AudioErrorTreatment::PassThrough => {
                // A frame flagged `missing` (including corrupt+missing) is
                // never pass-through'd (spec.md §8 boundary behavior): it is
                // zeroed like `Silence`. Only a plain `corrupt` frame (not
                // also missing) is emitted verbatim.
                for (i, ((samples, _), frame)) in groups.iter().zip(frames.iter()).enumerate() {
                    for (j, s) in samples.iter().enumerate() {
                        output[i * SAMPLES_PER_FRAME + j] = if frame.missing {
                            StereoSample { left: 0, right: 0 }
                        } else {
                            *s
                        };
                    }
                }
            }
            AudioErrorTreatment::Conceal => {
                self.conceal(&groups, &mut output);
            }
        }

        samples_to_bytes(&output)
    }

    /// Implements `findEndOfError`: on the first corrupt/missing frame,
    /// scan forward until a good frame, then interpolate the whole run
    /// between the last known-good sample and the next known-good one.
    fn conceal(
        &mut self,
        groups: &[([StereoSample; SAMPLES_PER_FRAME], bool)],
        output: &mut [StereoSample],
    ) {
        let flat: Vec<StereoSample> = groups.iter().flat_map(|(s, _)| s.iter().copied()).collect();
        let bad: Vec<bool> = groups
            .iter()
            .flat_map(|(_, bad)| std::iter::repeat(*bad).take(SAMPLES_PER_FRAME))
            .collect();

        let mut i = 0usize;
        while i < flat.len() {
            if !bad[i] {
                output[i] = flat[i];
                i += 1;
                continue;
            }
            let run_start = i;
            let mut run_end = i;
            while run_end < flat.len() && bad[run_end] {
                run_end += 1;
            }
            // run is [run_start, run_end)
            let before = if run_start > 0 { Some(flat[run_start - 1]) } else { None };
            let after = if run_end < flat.len() { Some(flat[run_end]) } else { None };
            let run_len = run_end - run_start;

            for (k, slot) in output[run_start..run_end].iter_mut().enumerate() {
                let interpolated = Self::interpolate(before, after, k, run_len);
                *slot = match self.concealment {
                    ConcealmentKind::Linear => interpolated,
                    ConcealmentKind::Predictive => {
                        let original = flat[run_start + k];
                        Self::predictive_choice(interpolated, original)
                    }
                };
            }
            self.stats.concealed_samples += run_len as u64;

            i = run_end;
        }
    }

    fn interpolate(
        before: Option<StereoSample>,
        after: Option<StereoSample>,
        k: usize,
        run_len: usize,
    ) -> StereoSample {
        match (before, after) {
            (Some(b), Some(a)) => {
                let t = (k + 1) as f64 / (run_len + 1) as f64;
                StereoSample {
                    left: lerp(b.left, a.left, t),
                    right: lerp(b.right, a.right, t),
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => StereoSample { left: 0, right: 0 },
        }
    }

    fn predictive_choice(interpolated: StereoSample, original: StereoSample) -> StereoSample {
        let keep = |orig: i16, interp: i16| -> i16 {
            if (orig as i32 - interp as i32).abs() <= PREDICTIVE_THRESHOLD {
                orig
            } else {
                interp
            }
        };
        StereoSample {
            left: keep(original.left, interpolated.left),
            right: keep(original.right, interpolated.right),
        }
    }
}

fn lerp(a: i16, b: i16, t: f64) -> i16 {
    (a as f64 + (b as f64 - a as f64) * t).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}
