//! F1-to-sector dispatcher (spec.md §4.5): groups 98 consecutive F1
//! frames (2352 bytes) into CD-ROM sectors, re-syncing on the
//! `00 FF*10 00` sector pattern and gap-padding addresses so disc time
//! stays contiguous for downstream A/V alignment (spec.md P5).

use std::collections::VecDeque;

use crate::efm::f1::F1Frame;
use crate::utils::bcd_decode;

const SECTOR_LEN: usize = 2352;
const SYNC_PATTERN: [u8; 12] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
const EDC_COVERED_LEN: usize = 2064;

static CRC32: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sector {
    /// Disc time address in BCD-decoded minutes/seconds/frames.
    pub address: (u8, u8, u8),
    pub mode: u8,
    pub payload: Vec<u8>,
    /// `None` for modes without an EDC (mode 0); `Some(false)` flags a
    /// checksum mismatch while still emitting the sector (spec.md §4.5).
    pub edc_valid: Option<bool>,
    /// Synthetic padding sector inserted to fill an address gap.
    pub is_padding: bool,
}

impl Sector {
    fn address_to_lba(address: (u8, u8, u8)) -> i64 {
        (address.0 as i64) * 60 * 75 + (address.1 as i64) * 75 + address.2 as i64
    }

    fn lba_to_address(lba: i64) -> (u8, u8, u8) {
        let lba = lba.max(0);
        let frames = (lba % 75) as u8;
        let seconds = ((lba / 75) % 60) as u8;
        let minutes = (lba / 75 / 60) as u8;
        (minutes, seconds, frames)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    GetInitialSync,
    GetNextSync,
    NoSync,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Statistics {
    pub sectors_emitted: u64,
    pub padding_sectors_emitted: u64,
    pub edc_mismatches: u64,
    pub resyncs: u64,
}

pub struct SectorSync {
    state: State,
    buffer: VecDeque<u8>,
    last_lba: Option<i64>,
    stats: Statistics,
}

impl Default for SectorSync {
    fn default() -> Self {
        Self::new()
    }
}

impl SectorSync {
    pub fn new() -> Self {
        Self {
            state: State::GetInitialSync,
            buffer: VecDeque::new(),
            last_lba: None,
            stats: Statistics::default(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn process(&mut self, f1_frames: &[F1Frame]) -> Vec<Sector> {
        for frame in f1_frames {
            self.buffer.extend(frame.data);
        }

        let mut out = Vec::new();
        loop {
            if self.buffer.len() < SECTOR_LEN {
                break;
            }
            match self.state {
                State::GetInitialSync => {
                    if !self.hunt_for_sync() {
                        break;
                    }
                    self.state = State::GetNextSync;
                }
                State::GetNextSync => {
                    if self.matches_sync_at(0) {
                        self.emit_sector(&mut out);
                    } else {
                        self.state = State::NoSync;
                    }
                }
                State::NoSync => {
                    if self.looks_like_data_at(0) {
                        // Treat as recovered alignment even without the
                        // literal sync bytes (spec.md §4.5 noSync test).
                        self.state = State::GetNextSync;
                        self.stats.resyncs += 1;
                    } else {
                        self.buffer.pop_front();
                    }
                }
            }
        }
        out
    }

    fn matches_sync_at(&self, offset: usize) -> bool {
        if self.buffer.len() < offset + SYNC_PATTERN.len() {
            return false;
        }
        (0..SYNC_PATTERN.len()).all(|i| self.buffer[offset + i] == SYNC_PATTERN[i])
    }

    /// Heuristic used by `noSync`: a real sector's byte distribution is
    /// far from uniform padding. We approximate "looks like data" by
    /// checking the block isn't a run of a single repeated byte.
    fn looks_like_data_at(&self, offset: usize) -> bool {
        if self.buffer.len() < offset + SECTOR_LEN {
            return false;
        }
        let first = self.buffer[offset];
        !(0..SECTOR_LEN).all(|i| self.buffer[offset + i] == first)
    }

    fn hunt_for_sync(&mut self) -> bool {
        let last_start = self.buffer.len() - SYNC_PATTERN.len();
        for start in 0..=last_start {
            if self.matches_sync_at(start) {
                for _ in 0..start {
                    self.buffer.pop_front();
                }
                return true;
            }
        }
        let keep = SYNC_PATTERN.len() - 1;
        while self.buffer.len() > keep {
            self.buffer.pop_front();
        }
        false
    }

    fn emit_sector(&mut self, out: &mut Vec<Sector>) {
        let block: Vec<u8> = self.buffer.drain(..SECTOR_LEN).collect();
        let address = (
            bcd_decode(block[12]).unwrap_or(0),
            bcd_decode(block[13]).unwrap_or(0),
            bcd_decode(block[14]).unwrap_or(0),
        );
        let mode = block[15];

        let lba = Sector::address_to_lba(address);
        if let Some(last) = self.last_lba {
            for gap_lba in (last + 1)..lba {
                out.push(Sector {
                    address: Sector::lba_to_address(gap_lba),
                    mode: 0,
                    payload: vec![0u8; SECTOR_LEN - 16],
                    edc_valid: None,
                    is_padding: true,
                });
                self.stats.padding_sectors_emitted += 1;
            }
        }
        self.last_lba = Some(lba);

        let payload = block[16..].to_vec();
        let edc_valid = if mode == 1 {
            let stored = u32::from_le_bytes([block[2064], block[2065], block[2066], block[2067]]);
            let computed = CRC32.checksum(&block[..EDC_COVERED_LEN]);
            let valid = stored == computed;
            if !valid {
                self.stats.edc_mismatches += 1;
            }
            Some(valid)
        } else {
            None
        };

        out.push(Sector {
            address,
            mode,
            payload,
            edc_valid,
            is_padding: false,
        });
        self.stats.sectors_emitted += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames_from_bytes(bytes: &[u8]) -> Vec<F1Frame> {
        bytes
            .chunks(24)
            .map(|chunk| {
                let mut data = [0u8; 24];
                data[..chunk.len()].copy_from_slice(chunk);
                F1Frame {
                    data,
                    corrupt: false,
                    missing: false,
                    disc_time: Default::default(),
                }
            })
            .collect()
    }

    fn build_mode1_sector(address: (u8, u8, u8)) -> Vec<u8> {
        let mut block = vec![0u8; SECTOR_LEN];
        block[..12].copy_from_slice(&SYNC_PATTERN);
        let bcd = |v: u8| ((v / 10) << 4) | (v % 10);
        block[12] = bcd(address.0);
        block[13] = bcd(address.1);
        block[14] = bcd(address.2);
        block[15] = 1;
        for (i, b) in block[16..2064].iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        let crc = CRC32.checksum(&block[..EDC_COVERED_LEN]);
        block[2064..2068].copy_from_slice(&crc.to_le_bytes());
        block
    }

    #[test]
    fn emits_two_consecutive_sectors() {
        let mut bytes = build_mode1_sector((0, 0, 0));
        bytes.extend(build_mode1_sector((0, 0, 1)));
        let frames = frames_from_bytes(&bytes);

        let mut sync = SectorSync::new();
        let sectors = sync.process(&frames);
        assert_eq!(sectors.len(), 2);
        assert_eq!(sectors[0].address, (0, 0, 0));
        assert_eq!(sectors[1].address, (0, 0, 1));
        assert_eq!(sectors[0].edc_valid, Some(true));
    }

    #[test]
    fn edc_mismatch_is_flagged_but_still_emitted() {
        let mut bytes = build_mode1_sector((0, 0, 0));
        bytes[100] ^= 0xFF;
        let frames = frames_from_bytes(&bytes);

        let mut sync = SectorSync::new();
        let sectors = sync.process(&frames);
        assert_eq!(sectors.len(), 1);
        assert_eq!(sectors[0].edc_valid, Some(false));
    }

    #[test]
    fn gap_between_addresses_is_padded() {
        let mut bytes = build_mode1_sector((0, 0, 0));
        bytes.extend(build_mode1_sector((0, 0, 3)));
        let frames = frames_from_bytes(&bytes);

        let mut sync = SectorSync::new();
        let sectors = sync.process(&frames);
        assert_eq!(sectors.len(), 4);
        assert_eq!(sectors[0].address, (0, 0, 0));
        assert_eq!(sectors[1].address, (0, 0, 1));
        assert!(sectors[1].is_padding);
        assert_eq!(sectors[2].address, (0, 0, 2));
        assert_eq!(sectors[3].address, (0, 0, 3));
        assert!(!sectors[3].is_padding);
    }

    #[test]
    fn all_zero_mode0_payload_decodes_verbatim() {
        let mut block = vec![0u8; SECTOR_LEN];
        block[..12].copy_from_slice(&SYNC_PATTERN);
        // address/mode all zero -> mode 0, all-zero payload
        let frames = frames_from_bytes(&block);
        let mut sync = SectorSync::new();
        let sectors = sync.process(&frames);
        assert_eq!(sectors.len(), 1);
        assert_eq!(sectors[0].mode, 0);
        assert!(sectors[0].payload.iter().all(|&b| b == 0));
        assert_eq!(sectors[0].edc_valid, None);
    }
}
