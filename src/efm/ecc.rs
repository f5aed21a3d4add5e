//! Sector P/Q ECC validation (spec.md §6 "two-parity-matrix ECC"; see
//! SPEC_FULL.md §11): a supplementary integrity check alongside the
//! sector EDC in [`crate::efm::sector`]. The CIRC layer upstream
//! already performs the heavy symbol-level correction (spec.md §4.4),
//! so this stage only *validates* the Mode-1 P/Q parity rather than
//! attempting to regenerate corrected data from it.
//!
//! Layout (Yellow Book Mode 1): the 2064 ECC-covered bytes (4-byte
//! header + 2048-byte user data + 4-byte EDC + 8 zero bytes) are
//! protected by 86 P-codewords (RS(26,24), read with stride 86 across
//! the 2064 bytes) and, over those 2064 bytes plus the resulting 172
//! P-parity bytes, by 52 Q-codewords (RS(45,43), read diagonally with
//! row increment 43 and column increment 44 modulo 2236). Both layers
//! are single-error-correcting, 2-parity-byte RS codes over the same
//! GF(256) field as CIRC and the AC-3 corrector.

use crate::rs_engine::{DecodeOutcome, ReedSolomon};

const ECC_DATA_LEN: usize = 2064;
const P_CODEWORDS: usize = 86;
const P_DATA_LEN: usize = 24;
const P_PARITY_LEN: usize = 2 * P_CODEWORDS;
const Q_CODEWORDS: usize = 52;
const Q_DATA_LEN: usize = 43;
const Q_PARITY_LEN: usize = 2 * Q_CODEWORDS;
const Q_SPAN: usize = ECC_DATA_LEN + P_PARITY_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EccStatus {
    pub p_valid: bool,
    pub q_valid: bool,
}

impl EccStatus {
    pub fn is_valid(&self) -> bool {
        self.p_valid && self.q_valid
    }
}

pub struct SectorEcc {
    p: ReedSolomon,
    q: ReedSolomon,
}

impl SectorEcc {
    pub fn new() -> Self {
        Self {
            p: ReedSolomon::new(P_DATA_LEN + 2, P_DATA_LEN),
            q: ReedSolomon::new(Q_DATA_LEN + 2, Q_DATA_LEN),
        }
    }

    fn p_indices(row: usize) -> [usize; P_DATA_LEN] {
        let mut idx = [0usize; P_DATA_LEN];
        for (i, slot) in idx.iter_mut().enumerate() {
            *slot = row + P_CODEWORDS * i;
        }
        idx
    }

    fn q_indices(row: usize) -> [usize; Q_DATA_LEN] {
        let mut idx = [0usize; Q_DATA_LEN];
        for (i, slot) in idx.iter_mut().enumerate() {
            *slot = (43 * i + 44 * row) % Q_SPAN;
        }
        idx
    }

    /// Compute the 172-byte P-parity block for a 2064-byte ECC input.
    pub fn encode_p(&self, ecc_data: &[u8; ECC_DATA_LEN]) -> [u8; P_PARITY_LEN] {
        let mut parity = [0u8; P_PARITY_LEN];
        for row in 0..P_CODEWORDS {
            let idx = Self::p_indices(row);
            let mut message = [0u8; P_DATA_LEN];
            for (i, &pos) in idx.iter().enumerate() {
                message[i] = ecc_data[pos];
            }
            let codeword = self.p.encode(&message);
            let parity_bytes = &codeword[P_DATA_LEN..];
            parity[2 * row] = parity_bytes[0];
            parity[2 * row + 1] = parity_bytes[1];
        }
        parity
    }

    /// Compute the 104-byte Q-parity block over the 2236-byte span
    /// (2064-byte ECC data followed by its 172-byte P-parity).
    pub fn encode_q(&self, span: &[u8; Q_SPAN]) -> [u8; Q_PARITY_LEN] {
        let mut parity = [0u8; Q_PARITY_LEN];
        for row in 0..Q_CODEWORDS {
            let idx = Self::q_indices(row);
            let mut message = [0u8; Q_DATA_LEN];
            for (i, &pos) in idx.iter().enumerate() {
                message[i] = span[pos];
            }
            let codeword = self.q.encode(&message);
            let parity_bytes = &codeword[Q_DATA_LEN..];
            parity[2 * row] = parity_bytes[0];
            parity[2 * row + 1] = parity_bytes[1];
        }
        parity
    }

    /// Validate a Mode-1 sector's stored P/Q parity against its
    /// 2064-byte ECC-covered payload. `ecc_data` is bytes 12..2076 of
    /// the 2352-byte sector (header + user data + EDC + zero-fill);
    /// `stored_p`/`stored_q` are the sector's own parity bytes.
    pub fn validate(
        &self,
        ecc_data: &[u8; ECC_DATA_LEN],
        stored_p: &[u8; P_PARITY_LEN],
        stored_q: &[u8; Q_PARITY_LEN],
    ) -> EccStatus {
        let p_valid = (0..P_CODEWORDS).all(|row| {
            let idx = Self::p_indices(row);
            let mut codeword = [0u8; P_DATA_LEN + 2];
            for (i, &pos) in idx.iter().enumerate() {
                codeword[i] = ecc_data[pos];
            }
            codeword[P_DATA_LEN] = stored_p[2 * row];
            codeword[P_DATA_LEN + 1] = stored_p[2 * row + 1];
            !matches!(self.p.decode(&codeword, &[]).outcome, DecodeOutcome::Uncorrectable)
        });

        let mut span = [0u8; Q_SPAN];
        span[..ECC_DATA_LEN].copy_from_slice(ecc_data);
        span[ECC_DATA_LEN..].copy_from_slice(stored_p);

        let q_valid = (0..Q_CODEWORDS).all(|row| {
            let idx = Self::q_indices(row);
            let mut codeword = [0u8; Q_DATA_LEN + 2];
            for (i, &pos) in idx.iter().enumerate() {
                codeword[i] = span[pos];
            }
            codeword[Q_DATA_LEN] = stored_q[2 * row];
            codeword[Q_DATA_LEN + 1] = stored_q[2 * row + 1];
            !matches!(self.q.decode(&codeword, &[]).outcome, DecodeOutcome::Uncorrectable)
        });

        EccStatus { p_valid, q_valid }
    }
}

impl Default for SectorEcc {
    fn default() -> Self {
        Self::new()
    }
}
