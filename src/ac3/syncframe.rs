//! AC-3 sync-frame extraction and CRC validation (spec.md §5.7),
//! grounded on `ac3_parsing.hpp`'s `SyncFrame` and the corrector's
//! zero-padding skip in `AC3Framer.hpp`: the corrector's payload
//! stream is scanned for the `0x0B77` sync word, fixed 1536-byte
//! frames (frmsizecod=28, fscod=0, the only combination this pipeline
//! supports) are sliced out, and each is checked against the two CRC-16
//! fields the AC-3 bitstream carries for exactly this purpose.

use crate::utils::crc16;

const SYNC_WORD: u16 = 0x0B77;
pub const FRAME_LEN: usize = 1536;
const CRC1_END: usize = 960;

#[derive(Debug, Clone)]
pub struct SyncFrame {
    pub bytes: Vec<u8>,
    pub crc1_valid: bool,
    pub crc2_valid: bool,
}

impl SyncFrame {
    pub fn is_valid(&self) -> bool {
        self.crc1_valid && self.crc2_valid
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Statistics {
    pub frames_found: u64,
    pub frames_valid: u64,
    pub bytes_skipped: u64,
}

/// Scans a corrected AC-3 payload stream for sync frames. Holds no
/// state across calls: the corrector already delivers one complete
/// block's worth of payload per call, so frame boundaries never
/// straddle a `process` invocation in practice, but any unconsumed
/// trailing bytes (a partial frame at the end of the buffer) are
/// simply left unscanned rather than carried forward, matching the
/// original tool's per-block extraction.
pub struct SyncFrameExtractor {
    stats: Statistics,
}

impl SyncFrameExtractor {
    pub fn new() -> Self {
        Self {
            stats: Statistics::default(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn process(&mut self, payload: &[u8]) -> Vec<SyncFrame> {
        let mut out = Vec::new();
        let mut i = 0;
        while i + 2 <= payload.len() {
            if i + FRAME_LEN > payload.len() {
                self.stats.bytes_skipped += (payload.len() - i) as u64;
                break;
            }

            let word = u16::from_be_bytes([payload[i], payload[i + 1]]);
            if word != SYNC_WORD {
                self.stats.bytes_skipped += 1;
                i += 1;
                continue;
            }

            let bytes = payload[i..i + FRAME_LEN].to_vec();
            let crc1_valid = crc16(&bytes[2..CRC1_END]) == 0;
            let crc2_valid = crc16(&bytes[CRC1_END..FRAME_LEN]) == 0;

            self.stats.frames_found += 1;
            if crc1_valid && crc2_valid {
                self.stats.frames_valid += 1;
            }

            out.push(SyncFrame {
                bytes,
                crc1_valid,
                crc2_valid,
            });
            i += FRAME_LEN;
        }
        out
    }
}

impl Default for SyncFrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crc_completed_frame(fill: u8) -> Vec<u8> {
        // CRC1 covers bytes[2..960] and is expected to reduce that
        // range (plus the stored CRC) to zero; reusing crc16's own
        // output as the trailing two bytes of each covered span
        // satisfies that self-check, since appending a CRC-16 of a
        // message to itself always drives the running CRC to zero.
        let mut bytes = vec![0u8; FRAME_LEN];
        bytes[0] = 0x0B;
        bytes[1] = 0x77;
        for b in bytes[2..CRC1_END - 2].iter_mut() {
            *b = fill;
        }
        let crc1 = crc16(&bytes[2..CRC1_END - 2]);
        bytes[CRC1_END - 2] = (crc1 >> 8) as u8;
        bytes[CRC1_END - 1] = (crc1 & 0xFF) as u8;

        for b in bytes[CRC1_END..FRAME_LEN - 2].iter_mut() {
            *b = fill.wrapping_add(1);
        }
        let crc2 = crc16(&bytes[CRC1_END..FRAME_LEN - 2]);
        bytes[FRAME_LEN - 2] = (crc2 >> 8) as u8;
        bytes[FRAME_LEN - 1] = (crc2 & 0xFF) as u8;
        bytes
    }

    #[test]
    fn finds_a_single_well_formed_frame_with_both_crcs_valid() {
        let payload = crc_completed_frame(0x42);
        let mut extractor = SyncFrameExtractor::new();
        let frames = extractor.process(&payload);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_valid());
    }

    #[test]
    fn skips_leading_padding_before_the_sync_word() {
        let mut payload = vec![0u8; 40];
        payload.extend(crc_completed_frame(0x11));
        let mut extractor = SyncFrameExtractor::new();
        let frames = extractor.process(&payload);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_valid());
        assert!(extractor.statistics().bytes_skipped >= 40);
    }

    #[test]
    fn corrupted_payload_bytes_flip_crc1_but_not_crc2() {
        let mut payload = crc_completed_frame(0x07);
        payload[500] ^= 0xFF;
        let mut extractor = SyncFrameExtractor::new();
        let frames = extractor.process(&payload);
        assert_eq!(frames.len(), 1);
        assert!(!frames[0].crc1_valid);
        assert!(frames[0].crc2_valid);
        assert!(!frames[0].is_valid());
    }

    #[test]
    fn a_trailing_partial_frame_is_left_unscanned() {
        let mut payload = crc_completed_frame(0x09);
        payload.extend([0x0B, 0x77, 1, 2, 3]);
        let mut extractor = SyncFrameExtractor::new();
        let frames = extractor.process(&payload);
        assert_eq!(frames.len(), 1);
        assert!(extractor.statistics().bytes_skipped >= 5);
    }
}
