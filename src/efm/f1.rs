//! F2-to-F1 deinterleaver (spec.md §4.4/§3): attaches corruption/
//! missing flags and monotonic disc-time to each F2 frame's 24 bytes.
//! 98 F1 frames make up one 2352-byte sector (spec.md §3), the same
//! cardinality as a subcode section, so disc time advances one
//! frame-number tick every 98 F1 frames (75 sectors/s CD timebase).

use crate::efm::circ::F2Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiscTime {
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

impl DiscTime {
    const FRAMES_PER_SECOND: u32 = 75;

    fn from_sector_index(sector_index: u64) -> Self {
        let total_frames = sector_index as u32;
        let seconds_total = total_frames / Self::FRAMES_PER_SECOND;
        Self {
            minutes: seconds_total / 60,
            seconds: seconds_total % 60,
            frames: total_frames % Self::FRAMES_PER_SECOND,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct F1Frame {
    pub data: [u8; 24],
    pub corrupt: bool,
    pub missing: bool,
    pub disc_time: DiscTime,
}

/// Tracks the running sector index (one tick per 98 F1 frames) so disc
/// time stays monotonic across calls.
pub struct F1Deinterleaver {
    frames_since_tick: usize,
    sector_index: u64,
}

impl Default for F1Deinterleaver {
    fn default() -> Self {
        Self::new()
    }
}

impl F1Deinterleaver {
    const FRAMES_PER_SECTOR: usize = 98;

    pub fn new() -> Self {
        Self {
            frames_since_tick: 0,
            sector_index: 0,
        }
    }

    pub fn process(&mut self, f2_frames: &[F2Frame]) -> Vec<F1Frame> {
        f2_frames
            .iter()
            .map(|f2| {
                let disc_time = DiscTime::from_sector_index(self.sector_index);
                let corrupt = f2.erasures.iter().any(|&e| e);

                self.frames_since_tick += 1;
                if self.frames_since_tick >= Self::FRAMES_PER_SECTOR {
                    self.frames_since_tick = 0;
                    self.sector_index += 1;
                }

                F1Frame {
                    data: f2.data,
                    corrupt,
                    missing: false,
                    disc_time,
                }
            })
            .collect()
    }

    /// Insert a synthetic missing frame, advancing the running disc
    /// time exactly as a real frame would. Used by gap-filling stages
    /// (spec.md §4.5) so audio and sectors stay aligned to disc time.
    pub fn missing_frame(&mut self) -> F1Frame {
        let disc_time = DiscTime::from_sector_index(self.sector_index);
        self.frames_since_tick += 1;
        if self.frames_since_tick >= Self::FRAMES_PER_SECTOR {
            self.frames_since_tick = 0;
            self.sector_index += 1;
        }
        F1Frame {
            data: [0; 24],
            corrupt: true,
            missing: true,
            disc_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_f2() -> F2Frame {
        F2Frame {
            data: [0; 24],
            erasures: [false; 24],
        }
    }

    #[test]
    fn disc_time_advances_once_per_sector() {
        let mut deinterleaver = F1Deinterleaver::new();
        let frames: Vec<F2Frame> = (0..98 * 3).map(|_| clean_f2()).collect();
        let f1_frames = deinterleaver.process(&frames);
        assert_eq!(f1_frames[0].disc_time, DiscTime::default());
        assert_eq!(
            f1_frames[98].disc_time,
            DiscTime {
                minutes: 0,
                seconds: 0,
                frames: 1,
            }
        );
        assert_eq!(
            f1_frames[98 * 2].disc_time,
            DiscTime {
                minutes: 0,
                seconds: 0,
                frames: 2,
            }
        );
    }

    #[test]
    fn corrupt_flag_follows_erasures() {
        let mut deinterleaver = F1Deinterleaver::new();
        let mut bad = clean_f2();
        bad.erasures[4] = true;
        let frames = deinterleaver.process(&[clean_f2(), bad]);
        assert!(!frames[0].corrupt);
        assert!(frames[1].corrupt);
        assert!(!frames[1].missing);
    }
}
