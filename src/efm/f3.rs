//! F3 frame assembler (spec.md §4.2): locates the EFM frame sync
//! pattern in the bit-cell stream and emits 34-symbol F3 frames (1
//! subcode marker + 32 data symbols, each demapped from a 14-bit EFM
//! channel word via [`crate::efm::demap`]).

use std::collections::VecDeque;

use crate::efm::demap;

/// 24-channel-bit EFM frame sync pattern (spec.md §6). Deliberately
/// violates the RLL(2,10) channel constraint (an 11-zero run) so it
/// can never occur in ordinary demodulated data.
const SYNC_PATTERN: [u8; 24] = [
    1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0,
];

const SYMBOL_BITS: usize = 14;
const MERGE_BITS: usize = 3;
const SYMBOLS_PER_FRAME: usize = 33; // 1 subcode + 32 data
const PAYLOAD_BITS: usize = SYMBOLS_PER_FRAME * (SYMBOL_BITS + MERGE_BITS);

/// Sentinel 14-bit channel words reserved for the subcode sync
/// markers. Both violate the RLL(2,10) constraint the data table is
/// built from, so they never collide with a demapped data byte.
const SUBCODE_SYNC0_WORD: u16 = 0x0000;
const SUBCODE_SYNC1_WORD: u16 = 0x3FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubcodeMarker {
    Sync0,
    Sync1,
    Value(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct F3Frame {
    pub subcode: SubcodeMarker,
    pub data: [u8; 32],
    pub erasures: [bool; 32],
}

impl F3Frame {
    pub fn is_subcode_sync0(&self) -> bool {
        matches!(self.subcode, SubcodeMarker::Sync0)
    }

    pub fn is_subcode_sync1(&self) -> bool {
        matches!(self.subcode, SubcodeMarker::Sync1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Hunting,
    Locked,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Statistics {
    pub frames_emitted: u64,
    pub resyncs: u64,
    pub erasures: u64,
}

/// Expands a T-value (bit-cell run length) into its channel-bit
/// representation: `t - 1` zeros followed by a single one-bit, mirror
/// of [`crate::efm::pll::Pll`]'s `push_t_value` encoding.
fn expand_t_value(t: u32, out: &mut VecDeque<u8>) {
    for _ in 1..t {
        out.push_back(0);
    }
    out.push_back(1);
}

pub struct F3Assembler {
    state: State,
    bits: VecDeque<u8>,
    stats: Statistics,
}

impl Default for F3Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl F3Assembler {
    pub fn new() -> Self {
        Self {
            state: State::Hunting,
            bits: VecDeque::new(),
            stats: Statistics::default(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn reset(&mut self) {
        self.state = State::Hunting;
        self.bits.clear();
    }

    /// Feed a run of T-values, returning any F3 frames now complete.
    pub fn process(&mut self, t_values: &[u32]) -> Vec<F3Frame> {
        for &t in t_values {
            expand_t_value(t, &mut self.bits);
        }

        let mut frames = Vec::new();
        loop {
            match self.state {
                State::Hunting => {
                    if !self.try_lock() {
                        break;
                    }
                    self.stats.resyncs += 1;
                }
                State::Locked => {
                    if self.bits.len() < PAYLOAD_BITS {
                        break;
                    }
                    let frame = self.parse_frame();
                    self.stats.frames_emitted += 1;
                    frames.push(frame);

                    // The next frame's leading sync should immediately follow.
                    if self.bits.len() < SYNC_PATTERN.len() || !self.matches_sync_at(0) {
                        self.state = State::Hunting;
                        continue;
                    }
                    for _ in 0..SYNC_PATTERN.len() {
                        self.bits.pop_front();
                    }
                }
            }
        }
        frames
    }

    fn matches_sync_at(&self, offset: usize) -> bool {
        if self.bits.len() < offset + SYNC_PATTERN.len() {
            return false;
        }
        (0..SYNC_PATTERN.len()).all(|i| self.bits[offset + i] == SYNC_PATTERN[i])
    }

    /// Search forward for the sync pattern, discarding bits ahead of a
    /// match. Bounded by the bits currently buffered; if no match is
    /// found the whole buffer (short of a trailing partial match) is
    /// discarded to keep memory bounded while more data streams in.
    fn try_lock(&mut self) -> bool {
        if self.bits.len() < SYNC_PATTERN.len() {
            return false;
        }
        let last_start = self.bits.len() - SYNC_PATTERN.len();
        for start in 0..=last_start {
            if self.matches_sync_at(start) {
                for _ in 0..(start + SYNC_PATTERN.len()) {
                    self.bits.pop_front();
                }
                self.state = State::Locked;
                return true;
            }
        }
        // No match anywhere in the buffer; keep only enough trailing
        // bits to catch a sync pattern straddling the next feed.
        let keep = SYNC_PATTERN.len() - 1;
        while self.bits.len() > keep {
            self.bits.pop_front();
        }
        false
    }

    /// Parse the 564 post-sync bits (3 merge + 33 symbols) of a
    /// locked-on frame.
    fn parse_frame(&mut self) -> F3Frame {
        for _ in 0..MERGE_BITS {
            self.bits.pop_front();
        }

        let subcode_word = self.take_symbol();
        let subcode = match subcode_word {
            SUBCODE_SYNC0_WORD => SubcodeMarker::Sync0,
            SUBCODE_SYNC1_WORD => SubcodeMarker::Sync1,
            word => SubcodeMarker::Value(demap::decode(word).unwrap_or(0)),
        };

        let mut data = [0u8; 32];
        let mut erasures = [false; 32];
        for i in 0..32 {
            let word = self.take_symbol();
            match demap::decode(word) {
                Some(byte) => data[i] = byte,
                None => {
                    erasures[i] = true;
                    self.stats.erasures += 1;
                }
            }
        }

        F3Frame {
            subcode,
            data,
            erasures,
        }
    }

    /// Consume one 14-bit symbol plus its 3 trailing merge bits,
    /// returning the symbol value MSB-first.
    fn take_symbol(&mut self) -> u16 {
        let mut word = 0u16;
        for _ in 0..SYMBOL_BITS {
            let bit = self.bits.pop_front().unwrap_or(0);
            word = (word << 1) | bit as u16;
        }
        for _ in 0..MERGE_BITS {
            self.bits.pop_front();
        }
        word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_to_t_values(bits: &[u8]) -> Vec<u32> {
        let mut t_values = Vec::new();
        let mut run = 0u32;
        for &b in bits {
            run += 1;
            if b == 1 {
                t_values.push(run);
                run = 0;
            }
        }
        t_values
    }

    fn synth_frame_bits(subcode: u16, data: &[u8; 32]) -> Vec<u8> {
        let mut bits = Vec::new();
        bits.extend_from_slice(&SYNC_PATTERN);
        bits.extend([0, 0, 0]); // merge after sync

        let mut push_symbol = |word: u16| {
            for i in (0..SYMBOL_BITS).rev() {
                bits.push(((word >> i) & 1) as u8);
            }
            bits.extend([0, 0, 0]);
        };
        push_symbol(subcode);
        for &byte in data {
            push_symbol(demap::encode(byte));
        }
        bits
    }

    #[test]
    fn locks_and_emits_a_frame_from_synthetic_bits() {
        let data: [u8; 32] = std::array::from_fn(|i| i as u8);
        let bits = synth_frame_bits(SUBCODE_SYNC0_WORD, &data);
        let t_values = bits_to_t_values(&bits);

        let mut assembler = F3Assembler::new();
        let frames = assembler.process(&t_values);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_subcode_sync0());
        assert_eq!(frames[0].data, data);
        assert!(frames[0].erasures.iter().all(|&e| !e));
    }

    #[test]
    fn two_consecutive_frames_stay_locked() {
        let data: [u8; 32] = [7; 32];
        let mut bits = synth_frame_bits(SUBCODE_SYNC0_WORD, &data);
        bits.extend(synth_frame_bits(SUBCODE_SYNC1_WORD, &data));
        let t_values = bits_to_t_values(&bits);

        let mut assembler = F3Assembler::new();
        let frames = assembler.process(&t_values);
        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_subcode_sync0());
        assert!(frames[1].is_subcode_sync1());
        assert_eq!(assembler.statistics().resyncs, 1);
    }

    #[test]
    fn garbage_before_sync_is_discarded() {
        let data: [u8; 32] = [1; 32];
        let mut bits = vec![0, 1, 0, 1, 1, 0, 0, 1];
        bits.extend(synth_frame_bits(SUBCODE_SYNC0_WORD, &data));
        let t_values = bits_to_t_values(&bits);

        let mut assembler = F3Assembler::new();
        let frames = assembler.process(&t_values);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, data);
    }
}
