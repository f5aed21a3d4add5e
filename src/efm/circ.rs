//! CIRC (Cross-Interleaved Reed-Solomon Code) decoder (spec.md §4.4):
//! two GF(256) Reed-Solomon passes over a subcode section, C1 row-wise
//! per F3 frame then C2 after de-interleaving, using
//! [`crate::rs_engine`].
//!
//! The real CIRC delay line spans many frames continuously (symbol `i`
//! of a C2 codeword is drawn from frames up to `i * 4` apart). This
//! decoder windows that delay line to the 98-frame section it is
//! handed, wrapping indices modulo the section length, so `decode`
//! stays a pure per-section call matching spec.md's
//! `decode(F3_section) -> F2_frames` contract instead of needing
//! cross-section state. This trades a little correction opportunity
//! at section boundaries for a self-contained API (see DESIGN.md).

use crate::efm::f3::F3Frame;
use crate::efm::section::{Section, SECTION_LEN};
use crate::rs_engine::{DecodeOutcome, ReedSolomon};

const C1_DELAY_STEP: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct F2Frame {
    pub data: [u8; 24],
    pub erasures: [bool; 24],
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Statistics {
    pub c1_valid: u64,
    pub c1_corrected: u64,
    pub c1_uncorrectable: u64,
    pub c2_valid: u64,
    pub c2_corrected: u64,
    pub c2_uncorrectable: u64,
}

pub struct CircDecoder {
    c1: ReedSolomon,
    c2: ReedSolomon,
    stats: Statistics,
}

impl Default for CircDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CircDecoder {
    pub fn new() -> Self {
        Self {
            c1: ReedSolomon::new(32, 28),
            c2: ReedSolomon::new(28, 24),
            stats: Statistics::default(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn decode(&mut self, section: &Section) -> Vec<F2Frame> {
        assert_eq!(section.frames.len(), SECTION_LEN, "section must be exactly 98 F3 frames");

        let (c1_data, c1_erasures) = self.run_c1(&section.frames);
        let mut out = Vec::with_capacity(SECTION_LEN);
        for t in 0..SECTION_LEN {
            let mut codeword = [0u8; 28];
            let mut erasure_flags = [false; 28];
            for i in 0..28 {
                let row = (t + SECTION_LEN - (i * C1_DELAY_STEP) % SECTION_LEN) % SECTION_LEN;
                codeword[i] = c1_data[row][i];
                erasure_flags[i] = c1_erasures[row][i];
            }
            out.push(self.run_c2(&codeword, &erasure_flags));
        }
        out
    }

    fn run_c1(&mut self, frames: &[F3Frame]) -> (Vec<[u8; 28]>, Vec<[bool; 28]>) {
        let mut data = Vec::with_capacity(frames.len());
        let mut erasures = Vec::with_capacity(frames.len());
        for frame in frames {
            let erasure_positions: Vec<usize> = frame
                .erasures
                .iter()
                .enumerate()
                .filter(|&(_, &e)| e)
                .map(|(i, _)| i)
                .collect();
            let result = self.c1.decode(&frame.data, &erasure_positions);
            let mut row = [0u8; 28];
            row.copy_from_slice(&result.data);
            let all_erased = matches!(result.outcome, DecodeOutcome::Uncorrectable);
            match result.outcome {
                DecodeOutcome::Valid => self.stats.c1_valid += 1,
                DecodeOutcome::Corrected(_) => self.stats.c1_corrected += 1,
                DecodeOutcome::Uncorrectable => self.stats.c1_uncorrectable += 1,
            }
            data.push(row);
            erasures.push([all_erased; 28]);
        }
        (data, erasures)
    }

    fn run_c2(&mut self, codeword: &[u8; 28], erasure_flags: &[bool; 28]) -> F2Frame {
        let erasure_positions: Vec<usize> = erasure_flags
            .iter()
            .enumerate()
            .filter(|&(_, &e)| e)
            .map(|(i, _)| i)
            .collect();
        let result = self.c2.decode(codeword, &erasure_positions);
        let mut data = [0u8; 24];
        data.copy_from_slice(&result.data);
        let all_erased = matches!(result.outcome, DecodeOutcome::Uncorrectable);
        match result.outcome {
            DecodeOutcome::Valid => self.stats.c2_valid += 1,
            DecodeOutcome::Corrected(_) => self.stats.c2_corrected += 1,
            DecodeOutcome::Uncorrectable => self.stats.c2_uncorrectable += 1,
        }
        F2Frame {
            data,
            erasures: [all_erased; 24],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::efm::f3::SubcodeMarker;
    use crate::rs_engine::ReedSolomon as Rs;

    fn clean_section() -> Section {
        let c1 = Rs::new(32, 28);
        let frames = (0..SECTION_LEN)
            .map(|n| {
                let message: Vec<u8> = (0..28u8).map(|i| i.wrapping_add(n as u8)).collect();
                let codeword = c1.encode(&message);
                let mut data = [0u8; 32];
                data.copy_from_slice(&codeword);
                F3Frame {
                    subcode: if n == 0 { SubcodeMarker::Sync0 } else { SubcodeMarker::Value(0) },
                    data,
                    erasures: [false; 32],
                }
            })
            .collect();
        Section { frames }
    }

    #[test]
    fn decodes_clean_section_with_no_uncorrectables() {
        let section = clean_section();
        let mut decoder = CircDecoder::new();
        let f2_frames = decoder.decode(&section);
        assert_eq!(f2_frames.len(), SECTION_LEN);
        assert_eq!(decoder.statistics().c1_uncorrectable, 0);
        assert_eq!(decoder.statistics().c2_uncorrectable, 0);
        assert!(f2_frames.iter().all(|f| f.erasures.iter().all(|&e| !e)));
    }

    #[test]
    fn single_symbol_corruption_is_corrected() {
        let mut section = clean_section();
        section.frames[10].data[3] ^= 0xFF;
        let mut decoder = CircDecoder::new();
        let f2_frames = decoder.decode(&section);
        assert_eq!(f2_frames.len(), SECTION_LEN);
        assert!(decoder.statistics().c1_corrected >= 1);
    }

    #[test]
    fn heavily_corrupted_frame_propagates_erasures() {
        let mut section = clean_section();
        for b in section.frames[5].data.iter_mut().take(10) {
            *b ^= 0xFF;
        }
        let mut decoder = CircDecoder::new();
        let f2_frames = decoder.decode(&section);
        assert!(decoder.statistics().c1_uncorrectable >= 1);
        assert!(f2_frames.iter().any(|f| f.erasures.iter().any(|&e| e)));
    }
}
