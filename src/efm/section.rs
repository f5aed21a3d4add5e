//! Subcode-section synchronizer (spec.md §4.3): groups F3 frames into
//! 98-frame sections aligned on SYNC0/SYNC1 markers, with a bounded
//! sync-recovery state machine ported from `syncf3frames.cpp`'s
//! `findInitialSync0 -> findNextSync -> {processSection | syncRecovery}`
//! chain.

use crate::efm::f3::F3Frame;

pub const SECTION_LEN: usize = 98;
const MAX_RECOVERY_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Section {
    pub frames: Vec<F3Frame>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FindInitialSync0,
    FindNextSync,
    SyncRecovery,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Statistics {
    pub total_f3_frames: u64,
    pub discarded_frames: u64,
    pub total_sections: u64,
    pub sync_lost_events: u64,
}

pub struct SectionSync {
    state: State,
    buffer: Vec<F3Frame>,
    recovery_attempts: u32,
    recovery_window_start: usize,
    stats: Statistics,
}

impl Default for SectionSync {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionSync {
    pub fn new() -> Self {
        Self {
            state: State::FindInitialSync0,
            buffer: Vec::new(),
            recovery_attempts: 0,
            recovery_window_start: 0,
            stats: Statistics::default(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn process(&mut self, frames: &[F3Frame]) -> Vec<Section> {
        let mut out = Vec::new();
        for &frame in frames {
            self.buffer.push(frame);
            self.stats.total_f3_frames += 1;
            self.step(&mut out);
        }
        out
    }

    fn is_sync(frame: &F3Frame) -> bool {
        frame.is_subcode_sync0() || frame.is_subcode_sync1()
    }

    fn step(&mut self, out: &mut Vec<Section>) {
        match self.state {
            State::FindInitialSync0 => {
                if Self::is_sync(self.buffer.last().unwrap()) {
                    self.state = State::FindNextSync;
                } else {
                    self.buffer.pop();
                    self.stats.discarded_frames += 1;
                }
            }
            State::FindNextSync => {
                if Self::is_sync(self.buffer.last().unwrap()) {
                    self.process_section(out);
                } else if self.buffer.len() > SECTION_LEN + 1 {
                    self.enter_recovery();
                }
            }
            State::SyncRecovery => {
                if Self::is_sync(self.buffer.last().unwrap()) {
                    // Anchor on the newly found sync frame; everything
                    // before it in this recovery window is unusable.
                    let anchor = self.buffer.pop().unwrap();
                    self.stats.discarded_frames += self.buffer.len() as u64;
                    self.buffer.clear();
                    self.buffer.push(anchor);
                    self.recovery_attempts = 0;
                    self.state = State::FindNextSync;
                } else if self.buffer.len() - self.recovery_window_start >= SECTION_LEN {
                    self.recovery_attempts += 1;
                    if self.recovery_attempts >= MAX_RECOVERY_ATTEMPTS {
                        self.sync_lost();
                    } else {
                        self.recovery_window_start = self.buffer.len();
                    }
                }
            }
        }
    }

    /// Emit the 98 frames preceding the newly found sync frame as a
    /// section; the sync frame itself becomes the start of the next
    /// section's buffer.
    fn process_section(&mut self, out: &mut Vec<Section>) {
        let next_sync = self.buffer.pop().unwrap();
        if self.buffer.len() == SECTION_LEN {
            let frames = std::mem::take(&mut self.buffer);
            out.push(Section { frames });
            self.stats.total_sections += 1;
        } else {
            // Length drifted from exactly 98 (should not happen once
            // locked, but guards against a corrupted run): discard and
            // restart the count from this sync frame.
            self.stats.discarded_frames += self.buffer.len() as u64;
        }
        self.buffer.clear();
        self.buffer.push(next_sync);
    }

    fn enter_recovery(&mut self) {
        self.recovery_window_start = self.buffer.len();
        self.recovery_attempts = 0;
        self.state = State::SyncRecovery;
    }

    fn sync_lost(&mut self) {
        self.stats.sync_lost_events += 1;
        self.stats.discarded_frames += self.buffer.len() as u64;
        self.buffer.clear();
        self.recovery_attempts = 0;
        self.state = State::FindInitialSync0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::efm::f3::SubcodeMarker;

    fn plain_frame() -> F3Frame {
        F3Frame {
            subcode: SubcodeMarker::Value(0),
            data: [0; 32],
            erasures: [false; 32],
        }
    }

    fn sync0_frame() -> F3Frame {
        F3Frame {
            subcode: SubcodeMarker::Sync0,
            data: [0; 32],
            erasures: [false; 32],
        }
    }

    fn sync1_frame() -> F3Frame {
        F3Frame {
            subcode: SubcodeMarker::Sync1,
            ..sync0_frame()
        }
    }

    #[test]
    fn emits_exactly_98_frame_sections_starting_sync0() {
        let mut frames = vec![sync0_frame()];
        frames.extend((0..97).map(|_| plain_frame()));
        frames.push(sync1_frame()); // start of section 2
        frames.extend((0..97).map(|_| plain_frame()));
        frames.push(sync0_frame()); // start of section 3, terminates section 2

        let mut sync = SectionSync::new();
        let sections = sync.process(&frames);
        assert_eq!(sections.len(), 2);
        for section in &sections {
            assert_eq!(section.frames.len(), SECTION_LEN);
        }
        assert!(sections[0].frames[0].is_subcode_sync0());
        assert!(sections[1].frames[0].is_subcode_sync1());
    }

    #[test]
    fn discards_leading_garbage_before_initial_sync() {
        let mut frames = vec![plain_frame(), plain_frame(), plain_frame()];
        frames.push(sync0_frame());
        frames.extend((0..97).map(|_| plain_frame()));
        frames.push(sync0_frame());

        let mut sync = SectionSync::new();
        let sections = sync.process(&frames);
        assert_eq!(sections.len(), 1);
        assert_eq!(sync.statistics().discarded_frames, 3);
    }

    #[test]
    fn recovers_from_a_single_missed_sync() {
        // Locked on sync0, then the section boundary sync is missing
        // for this section, but the next one's sync0 arrives 1 section
        // frame late -- recovery should re-anchor on it.
        let mut frames = vec![sync0_frame()];
        frames.extend((0..SECTION_LEN + 3).map(|_| plain_frame()));
        frames.push(sync0_frame());
        frames.extend((0..SECTION_LEN - 1).map(|_| plain_frame()));
        frames.push(sync0_frame());

        let mut sync = SectionSync::new();
        let sections = sync.process(&frames);
        assert!(!sections.is_empty());
        assert_eq!(sync.statistics().sync_lost_events, 0);
    }

    #[test]
    fn gives_up_after_five_recovery_attempts_and_resyncs() {
        // No further sync markers at all after the initial lock: every
        // recovery window is empty, so sync is eventually declared
        // lost and the state machine returns to hunting.
        let mut frames = vec![sync0_frame()];
        frames.extend((0..(SECTION_LEN + 1) * 7).map(|_| plain_frame()));
        frames.push(sync0_frame());
        frames.extend((0..97).map(|_| plain_frame()));
        frames.push(sync0_frame());

        let mut sync = SectionSync::new();
        let sections = sync.process(&frames);
        assert!(sync.statistics().sync_lost_events >= 1);
        assert!(!sections.is_empty());
    }
}
