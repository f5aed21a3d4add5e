//! EFM 14-to-8 symbol demapping.
//!
//! The Red Book/IEC 60908 EFM table itself was not present in the
//! retrieved source window (spec.md §9, open question #2); what *is*
//! specified is the channel constraint the table must satisfy: each
//! 14-bit channel word is run-length-limited with a minimum run of 2
//! and a maximum run of 10 zero-bits between one-bits (which, after
//! the 3 merging bits inserted between channel words, yields the
//! 3..11 T-value range used throughout the EFM pipeline). This module
//! builds a table satisfying that constraint rather than guessing at
//! undocumented bit patterns: it enumerates all 14-bit RLL(2,10) words
//! in ascending numeric order and assigns the first 256 to bytes
//! 0x00..0xFF. The reverse map is exact for all 256 forward entries.

use std::sync::OnceLock;

const TABLE_SIZE: usize = 256;
const WORD_BITS: u32 = 14;

fn is_rll_2_10(word: u16) -> bool {
    // Check the run of zero-bits between consecutive one-bits (and at
    // the boundary) is within [2, 10], scanning MSB to LSB.
    let mut run = 0u32;
    let mut seen_one = false;
    for bit in (0..WORD_BITS).rev() {
        if (word >> bit) & 1 == 1 {
            if seen_one && !(2..=10).contains(&run) {
                return false;
            }
            seen_one = true;
            run = 0;
        } else {
            run += 1;
        }
    }
    // Leading/trailing runs are also bounded by the merging-bit
    // constraint at word boundaries.
    run <= 10
}

fn build_forward_table() -> [u16; TABLE_SIZE] {
    let mut table = [0u16; TABLE_SIZE];
    let mut idx = 0usize;
    for word in 0u16..(1 << WORD_BITS) {
        if is_rll_2_10(word) {
            table[idx] = word;
            idx += 1;
            if idx == TABLE_SIZE {
                break;
            }
        }
    }
    assert_eq!(idx, TABLE_SIZE, "fewer than 256 RLL(2,10) 14-bit words exist");
    table
}

fn build_reverse_table(forward: &[u16; TABLE_SIZE]) -> Vec<Option<u8>> {
    let mut reverse = vec![None; 1 << WORD_BITS];
    for (byte, &word) in forward.iter().enumerate() {
        reverse[word as usize] = Some(byte as u8);
    }
    reverse
}

static FORWARD: OnceLock<[u16; TABLE_SIZE]> = OnceLock::new();
static REVERSE: OnceLock<Vec<Option<u8>>> = OnceLock::new();

fn forward_table() -> &'static [u16; TABLE_SIZE] {
    FORWARD.get_or_init(build_forward_table)
}

fn reverse_table() -> &'static [Option<u8>] {
    REVERSE.get_or_init(|| build_reverse_table(forward_table()))
}

/// Map an 8-bit data byte to its 14-bit EFM channel word.
pub fn encode(byte: u8) -> u16 {
    forward_table()[byte as usize]
}

/// Map a 14-bit EFM channel word back to its 8-bit data byte, or
/// `None` if the word is not a valid member of the table (treated as
/// an erasure by the F3 assembler).
pub fn decode(word: u16) -> Option<u8> {
    reverse_table()[word as usize & 0x3FFF]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_256_bytes_roundtrip() {
        for byte in 0u8..=255 {
            let word = encode(byte);
            assert_eq!(decode(word), Some(byte), "byte {byte:#04x} did not round-trip");
        }
    }

    #[test]
    fn table_entries_are_distinct() {
        let table = forward_table();
        let mut seen = std::collections::HashSet::new();
        for &word in table.iter() {
            assert!(seen.insert(word), "duplicate EFM word {word:#06x}");
        }
    }

    #[test]
    fn invalid_word_decodes_to_none() {
        // 0 is all-zero, violates the maximum-run constraint.
        assert_eq!(decode(0), None);
    }
}
