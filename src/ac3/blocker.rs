//! QPSK frame-to-block assembler (spec.md §5.5), grounded on
//! `Blocker.hpp`: collects 72 sequentially numbered QPSK frames (37
//! bytes each) into one 2664-byte block, tolerating an out-of-sequence
//! frame number by substituting the expected number and resetting the
//! in-sequence run counter instead of discarding the block.

use crate::ac3::framer::QpskFrame;

pub const FRAMES_PER_BLOCK: usize = 72;
const BYTES_PER_FRAME: usize = 37;
pub const BLOCK_LEN: usize = FRAMES_PER_BLOCK * BYTES_PER_FRAME;

#[derive(Debug, Clone)]
pub struct QpskBlock {
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Statistics {
    pub blocks_emitted: u64,
    pub out_of_sequence_frames: u64,
}

pub struct Blocker {
    initialized: bool,
    current: Vec<u8>,
    frames_consumed: usize,
    expected_seq: u8,
    stats: Statistics,
}

impl Blocker {
    pub fn new() -> Self {
        Self {
            initialized: false,
            current: vec![0u8; BLOCK_LEN],
            frames_consumed: 0,
            expected_seq: 0,
            stats: Statistics::default(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn process(&mut self, frames: &[QpskFrame]) -> Vec<QpskBlock> {
        let mut out = Vec::new();
        for frame in frames {
            // Drop frames before the very first frame-0, so a block
            // always starts aligned (spec.md §5.5).
            if !self.initialized {
                if frame.frame_number != 0 {
                    continue;
                }
                self.initialized = true;
            }

            let used_frame_no = if frame.frame_number != self.expected_seq {
                self.stats.out_of_sequence_frames += 1;
                self.expected_seq
            } else {
                frame.frame_number
            };

            if self.frames_consumed < FRAMES_PER_BLOCK {
                let start = BYTES_PER_FRAME * self.frames_consumed;
                self.current[start..start + BYTES_PER_FRAME].copy_from_slice(&frame.bytes);
            }
            self.frames_consumed += 1;

            if used_frame_no == 71 && self.frames_consumed == FRAMES_PER_BLOCK {
                self.expected_seq = 0;
                self.frames_consumed = 0;
                out.push(QpskBlock {
                    bytes: std::mem::replace(&mut self.current, vec![0u8; BLOCK_LEN]),
                });
                self.stats.blocks_emitted += 1;
            } else {
                self.expected_seq = used_frame_no.wrapping_add(1);
            }
        }
        out
    }
}

impl Default for Blocker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: u8, fill: u8) -> QpskFrame {
        QpskFrame {
            frame_number: n,
            bytes: [fill; BYTES_PER_FRAME],
        }
    }

    #[test]
    fn assembles_72_in_sequence_frames_into_one_block() {
        let frames: Vec<QpskFrame> = (0..72u8).map(|n| frame(n, n)).collect();
        let mut blocker = Blocker::new();
        let blocks = blocker.process(&frames);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].bytes.len(), BLOCK_LEN);
        assert_eq!(blocks[0].bytes[0], 0);
        assert_eq!(blocks[0].bytes[37], 1);
    }

    #[test]
    fn leading_frames_before_frame_zero_are_dropped() {
        let mut frames = vec![frame(50, 9), frame(51, 9)];
        frames.extend((0..72u8).map(|n| frame(n, n)));
        let mut blocker = Blocker::new();
        let blocks = blocker.process(&frames);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn a_mislabeled_frame_is_substituted_and_the_block_still_completes() {
        // All 72 physical frames arrive, but frame 30's number field
        // was misread; the expected sequence number is substituted so
        // the block still reaches 72 frames.
        let mut frames: Vec<QpskFrame> = (0..72u8).map(|n| frame(n, n)).collect();
        frames[30].frame_number = 5;
        let mut blocker = Blocker::new();
        let blocks = blocker.process(&frames);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocker.statistics().out_of_sequence_frames, 1);
    }
}
