//! GF(256) arithmetic and a general Reed-Solomon encoder/decoder,
//! shared by the EFM CIRC stage (two interleaved RS(32,28)/RS(28,24)
//! passes) and the AC-3 corrector (RS(37,33) then RS(36,32)).
//!
//! Field generator polynomial `x^8+x^4+x^3+x^2+1` (0x11D), the
//! standard CD/IEC 60908 field, reproduced with log/antilog tables.

const FIELD_SIZE: usize = 256;
const PRIMITIVE_POLY: u16 = 0x11D;

pub struct Gf256 {
    exp: [u8; FIELD_SIZE * 2],
    log: [u8; FIELD_SIZE],
}

impl Gf256 {
    pub fn new() -> Self {
        let mut exp = [0u8; FIELD_SIZE * 2];
        let mut log = [0u8; FIELD_SIZE];
        let mut x: u16 = 1;
        for i in 0..255usize {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= PRIMITIVE_POLY;
            }
        }
        for i in 255..FIELD_SIZE * 2 {
            exp[i] = exp[i - 255];
        }
        Self { exp, log }
    }

    pub fn mul(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let sum = self.log[a as usize] as usize + self.log[b as usize] as usize;
        self.exp[sum]
    }

    pub fn div(&self, a: u8, b: u8) -> u8 {
        assert!(b != 0, "division by zero in GF(256)");
        if a == 0 {
            return 0;
        }
        let diff = 255 + self.log[a as usize] as usize - self.log[b as usize] as usize;
        self.exp[diff]
    }

    pub fn pow(&self, a: u8, power: usize) -> u8 {
        if a == 0 {
            return 0;
        }
        let e = (self.log[a as usize] as usize * power) % 255;
        self.exp[e]
    }

    pub fn inv(&self, a: u8) -> u8 {
        assert!(a != 0, "zero has no multiplicative inverse");
        self.exp[255 - self.log[a as usize] as usize]
    }
}

impl Default for Gf256 {
    fn default() -> Self {
        Self::new()
    }
}

/// A Reed-Solomon code over GF(256) with `n` total symbols and `k`
/// message symbols (so `n - k` parity symbols), `n - k` even is not
/// required. Handles both plain error correction (syndrome decoding
/// via Berlekamp-Massey + Chien + Forney) and erasure-assisted
/// decoding, matching the "erasure flags carried alongside data"
/// interface used by the CIRC stage.
pub struct ReedSolomon {
    gf: Gf256,
    n: usize,
    k: usize,
    generator: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    Valid,
    Corrected(usize),
    Uncorrectable,
}

pub struct DecodeResult {
    pub data: Vec<u8>,
    pub outcome: DecodeOutcome,
}

impl ReedSolomon {
    pub fn new(n: usize, k: usize) -> Self {
        assert!(k < n && n <= 255, "invalid (n, k) for GF(256) RS code");
        let gf = Gf256::new();
        let generator = Self::build_generator(&gf, n - k);
        Self { gf, n, k, generator }
    }

    fn build_generator(gf: &Gf256, parity_len: usize) -> Vec<u8> {
        let mut g = vec![1u8];
        for i in 0..parity_len {
            let root = gf.exp[i];
            let mut next = vec![0u8; g.len() + 1];
            for (j, &coeff) in g.iter().enumerate() {
                next[j] ^= gf.mul(coeff, root);
                next[j + 1] ^= coeff;
            }
            g = next;
        }
        g
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn parity_len(&self) -> usize {
        self.n - self.k
    }

    /// Systematic encode: returns `n` symbols, message followed by parity.
    pub fn encode(&self, message: &[u8]) -> Vec<u8> {
        assert_eq!(message.len(), self.k, "message length must equal k");
        let parity_len = self.parity_len();
        let mut remainder = vec![0u8; parity_len];
        for &msg_sym in message {
            let feedback = msg_sym ^ remainder[0];
            remainder.rotate_left(1);
            *remainder.last_mut().unwrap() = 0;
            if feedback != 0 {
                for (coeff, rem) in self.generator[1..].iter().zip(remainder.iter_mut()) {
                    *rem ^= self.gf.mul(feedback, *coeff);
                }
            }
        }
        let mut out = message.to_vec();
        out.extend(remainder);
        out
    }

    fn syndromes(&self, received: &[u8]) -> Vec<u8> {
        let parity_len = self.parity_len();
        (0..parity_len)
            .map(|i| {
                let root = self.gf.exp[i];
                received.iter().rev().fold(0u8, |acc, &sym| {
                    self.gf.mul(acc, root) ^ sym
                })
            })
            .collect()
    }

    /// Decode `received` (length `n`), with optional erasure positions
    /// (indices into `received` known a priori to be unreliable).
    /// Returns the corrected message (first `k` symbols) plus how many
    /// symbol errors/erasures were applied, or `Uncorrectable` if the
    /// syndrome is nonzero and the error+erasure count exceeds capacity.
    pub fn decode(&self, received: &[u8], erasures: &[usize]) -> DecodeResult {
        assert_eq!(received.len(), self.n);
        let syndromes = self.syndromes(received);
        if syndromes.iter().all(|&s| s == 0) {
            return DecodeResult {
                data: received[..self.k].to_vec(),
                outcome: DecodeOutcome::Valid,
            };
        }

        let parity_len = self.parity_len();
        let max_correctable = parity_len / 2;
        if erasures.len() > parity_len {
            return DecodeResult {
                data: received[..self.k].to_vec(),
                outcome: DecodeOutcome::Uncorrectable,
            };
        }

        // Erasure locator polynomial.
        let erasure_locs: Vec<u8> = erasures
            .iter()
            .map(|&pos| self.gf.exp[(self.n - 1 - pos) % 255])
            .collect();
        let sigma = self.berlekamp_massey(&syndromes, &erasure_locs);

        let error_positions = self.chien_search(&sigma);
        let total_errs = error_positions.len();
        if total_errs == 0 || total_errs > max_correctable + erasures.len() {
            return DecodeResult {
                data: received[..self.k].to_vec(),
                outcome: DecodeOutcome::Uncorrectable,
            };
        }

        let mut corrected = received.to_vec();
        self.forney_correct(&mut corrected, &syndromes, &sigma, &error_positions);

        let verify = self.syndromes(&corrected);
        if verify.iter().any(|&s| s != 0) {
            return DecodeResult {
                data: received[..self.k].to_vec(),
                outcome: DecodeOutcome::Uncorrectable,
            };
        }

        DecodeResult {
            data: corrected[..self.k].to_vec(),
            outcome: DecodeOutcome::Corrected(total_errs),
        }
    }

    /// Berlekamp-Massey with erasure locators pre-seeded, producing the
    /// combined error+erasure locator polynomial.
    fn berlekamp_massey(&self, syndromes: &[u8], erasure_locs: &[u8]) -> Vec<u8> {
        let gf = &self.gf;
        let mut sigma = vec![1u8];
        for &loc in erasure_locs {
            let mut next = vec![0u8; sigma.len() + 1];
            for (i, &c) in sigma.iter().enumerate() {
                next[i] ^= c;
                next[i + 1] ^= gf.mul(c, loc);
            }
            sigma = next;
        }

        let mut old_sigma = sigma.clone();
        let mut old_m = 1usize;
        let mut b = 1u8;

        for n in erasure_locs.len()..syndromes.len() {
            let mut delta = syndromes[n];
            for i in 1..sigma.len() {
                if n >= i {
                    delta ^= gf.mul(sigma[i], syndromes[n - i]);
                }
            }
            if delta == 0 {
                old_m += 1;
                continue;
            }
            let scale = gf.div(delta, b);
            let mut new_sigma = sigma.clone();
            let needed_len = old_sigma.len() + old_m;
            if new_sigma.len() < needed_len {
                new_sigma.resize(needed_len, 0);
            }
            for (i, &c) in old_sigma.iter().enumerate() {
                new_sigma[i + old_m] ^= gf.mul(scale, c);
            }
            if 2 * (sigma.len() - 1) <= n {
                old_sigma = sigma.clone();
                old_m = 1;
                b = delta;
            } else {
                old_m += 1;
            }
            sigma = new_sigma;
        }
        sigma
    }

    fn chien_search(&self, sigma: &[u8]) -> Vec<usize> {
        let gf = &self.gf;
        let mut positions = Vec::new();
        for i in 0..self.n {
            let x_inv = gf.exp[(255 - i % 255) % 255];
            let mut acc = 0u8;
            for (j, &c) in sigma.iter().enumerate() {
                acc ^= gf.mul(c, gf.pow(x_inv, j));
            }
            if acc == 0 {
                positions.push(self.n - 1 - i);
            }
        }
        positions
    }

    fn forney_correct(
        &self,
        data: &mut [u8],
        syndromes: &[u8],
        sigma: &[u8],
        error_positions: &[usize],
    ) {
        let gf = &self.gf;
        let omega = Self::error_evaluator(gf, syndromes, sigma);
        for &pos in error_positions {
            let x_inv = gf.exp[(255 - (self.n - 1 - pos) % 255) % 255];
            let mut omega_val = 0u8;
            for (j, &c) in omega.iter().enumerate() {
                omega_val ^= gf.mul(c, gf.pow(x_inv, j));
            }
            let mut sigma_deriv_val = 0u8;
            let mut j = 1;
            while j < sigma.len() {
                sigma_deriv_val ^= gf.mul(sigma[j], gf.pow(x_inv, j - 1));
                j += 2;
            }
            if sigma_deriv_val == 0 {
                continue;
            }
            let x = gf.exp[(self.n - 1 - pos) % 255];
            let magnitude = gf.mul(x, gf.div(omega_val, sigma_deriv_val));
            data[pos] ^= magnitude;
        }
    }

    fn error_evaluator(gf: &Gf256, syndromes: &[u8], sigma: &[u8]) -> Vec<u8> {
        let mut omega = vec![0u8; syndromes.len()];
        for i in 0..syndromes.len() {
            let mut acc = 0u8;
            for j in 0..=i.min(sigma.len() - 1) {
                acc ^= gf.mul(sigma[j], syndromes[i - j]);
            }
            omega[i] = acc;
        }
        omega
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gf256_inverse_roundtrips() {
        let gf = Gf256::new();
        for a in 1..=255u8 {
            let inv = gf.inv(a);
            assert_eq!(gf.mul(a, inv), 1);
        }
    }

    #[test]
    fn encode_then_decode_clean_codeword_is_valid() {
        let rs = ReedSolomon::new(32, 28);
        let message: Vec<u8> = (0..28u8).collect();
        let codeword = rs.encode(&message);
        let result = rs.decode(&codeword, &[]);
        assert_eq!(result.outcome, DecodeOutcome::Valid);
        assert_eq!(result.data, message);
    }

    #[test]
    fn corrects_single_symbol_error() {
        let rs = ReedSolomon::new(32, 28);
        let message: Vec<u8> = (0..28u8).map(|v| v.wrapping_mul(7)).collect();
        let mut codeword = rs.encode(&message);
        codeword[5] ^= 0xA5;
        let result = rs.decode(&codeword, &[]);
        assert!(matches!(result.outcome, DecodeOutcome::Corrected(_)));
        assert_eq!(result.data, message);
    }

    #[test]
    fn reports_uncorrectable_when_errors_exceed_capacity() {
        let rs = ReedSolomon::new(32, 28);
        let message: Vec<u8> = (0..28u8).collect();
        let mut codeword = rs.encode(&message);
        for i in 0..10 {
            codeword[i] ^= 0xFF;
        }
        let result = rs.decode(&codeword, &[]);
        assert_eq!(result.outcome, DecodeOutcome::Uncorrectable);
    }

    #[test]
    fn rs_37_33_handles_ac3_sized_code() {
        let rs = ReedSolomon::new(37, 33);
        let message: Vec<u8> = (0..33u8).collect();
        let codeword = rs.encode(&message);
        assert_eq!(codeword.len(), 37);
        let result = rs.decode(&codeword, &[]);
        assert_eq!(result.outcome, DecodeOutcome::Valid);
    }
}
