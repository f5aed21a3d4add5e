//! Two-pass Reed-Solomon corrector (spec.md §5.6), grounded on
//! `Corrector.hpp`: a 2664-byte QPSK block is 36 rows of 74
//! interleaved bytes. C1 (RS(37,33)) decodes the odd/even halves of
//! each row; any half it cannot correct is marked erased. C2
//! (RS(36,32)) then decodes each of the 66 data columns spanning all
//! 36 rows, consuming the C1 erasure flags, and the corrected payload
//! (minus the leading `0x10 0x00` block marker) is returned.

use crate::ac3::blocker::QpskBlock;
use crate::rs_engine::{DecodeOutcome, ReedSolomon};

const ROWS: usize = 36;
const ROW_LEN: usize = 74;
const DATA_COLUMNS: usize = 66;

#[derive(Debug, Default, Clone, Copy)]
pub struct Statistics {
    pub c1_valid: u64,
    pub c1_corrected: u64,
    pub c1_uncorrectable: u64,
    pub c2_valid: u64,
    pub c2_corrected: u64,
    pub c2_uncorrectable: u64,
}

pub struct Corrector {
    c1: ReedSolomon,
    c2: ReedSolomon,
    stats: Statistics,
}

impl Corrector {
    pub fn new() -> Self {
        Self {
            c1: ReedSolomon::new(37, 33),
            c2: ReedSolomon::new(36, 32),
            stats: Statistics::default(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn decode(&mut self, block: &QpskBlock) -> Vec<u8> {
        assert_eq!(block.bytes.len(), ROWS * ROW_LEN);

        let mut bytes = block.bytes.clone();
        let mut erased = vec![false; ROWS * ROW_LEN];
        self.run_c1(&mut bytes, &mut erased);
        self.run_c2(&bytes, &erased)
    }

    fn run_c1(&mut self, bytes: &mut [u8], erased: &mut [bool]) {
        for row in 0..ROWS {
            for odd in 0..2 {
                let mut codeword = [0u8; 37];
                for (i, slot) in codeword.iter_mut().enumerate() {
                    *slot = bytes[row * ROW_LEN + i * 2 + odd];
                }
                let result = self.c1.decode(&codeword, &[]);
                match result.outcome {
                    DecodeOutcome::Valid => self.stats.c1_valid += 1,
                    DecodeOutcome::Corrected(_) => self.stats.c1_corrected += 1,
                    DecodeOutcome::Uncorrectable => self.stats.c1_uncorrectable += 1,
                }

                let uncorrectable = matches!(result.outcome, DecodeOutcome::Uncorrectable);
                for (i, &data_byte) in result.data.iter().enumerate() {
                    let pos = row * ROW_LEN + i * 2 + odd;
                    if !uncorrectable {
                        bytes[pos] = data_byte;
                    }
                    erased[pos] = uncorrectable;
                }
            }
        }
    }

    fn run_c2(&mut self, bytes: &[u8], erased: &[bool]) -> Vec<u8> {
        let mut out = Vec::with_capacity(DATA_COLUMNS * 32);
        for k in 0..DATA_COLUMNS {
            let mut codeword = [0u8; 36];
            let mut erasures = Vec::new();
            for (row, slot) in codeword.iter_mut().enumerate() {
                let pos = k + row * ROW_LEN;
                *slot = bytes[pos];
                if erased[pos] {
                    erasures.push(row);
                }
            }

            let result = self.c2.decode(&codeword, &erasures);
            match result.outcome {
                DecodeOutcome::Valid => self.stats.c2_valid += 1,
                DecodeOutcome::Corrected(_) => self.stats.c2_corrected += 1,
                DecodeOutcome::Uncorrectable => self.stats.c2_uncorrectable += 1,
            }

            if k == 0 {
                if result.data[0] == 0x10 && result.data[1] == 0x00 {
                    out.extend_from_slice(&result.data[2..]);
                }
                // A missing/garbled block marker means this column's
                // bytes are not attributable to the payload; they are
                // silently dropped, matching the original corrector.
            } else {
                out.extend_from_slice(&result.data);
            }
        }
        out
    }
}

impl Default for Corrector {
    fn default() -> Self {
        Self::new()
    }
}
