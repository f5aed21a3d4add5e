//! Chapter and stop-code extraction from a sequence of per-field VBI
//! records, grounded on the original decoder's single forward pass
//! over a disc's field metadata.

use std::collections::BTreeSet;

use crate::vbi::decode::Vbi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chapter {
    pub start_field: usize,
    pub end_field: usize,
    pub number: i32,
}

#[derive(Debug, Clone, Default)]
pub struct NavigationInfo {
    pub chapters: Vec<Chapter>,
    pub stop_codes: BTreeSet<usize>,
}

/// Minimum field span a chapter marker must hold before it's trusted;
/// chapter codes have no error detection, so a shorter run is treated
/// as a corrupted stray marker rather than a real chapter change.
const MIN_CHAPTER_FIELDS: usize = 10;

/// Walk a disc's per-field VBI records (one per field, in capture
/// order; `is_first_field` marks the first field of each frame pair)
/// and extract chapter boundaries and picture-stop-code positions.
pub fn extract(fields: &[(bool, Vbi)]) -> NavigationInfo {
    let mut raw_chapters: Vec<Chapter> = Vec::new();
    let mut stop_codes = BTreeSet::new();
    let mut chapter: Option<i32> = None;
    let mut first_field_index = 0usize;

    for (field_index, (is_first_field, vbi)) in fields.iter().enumerate() {
        if *is_first_field {
            first_field_index = field_index;
        }

        if let Some(ch_no) = vbi.ch_no {
            if chapter != Some(ch_no) {
                chapter = Some(ch_no);
                raw_chapters.push(Chapter {
                    start_field: first_field_index,
                    end_field: usize::MAX,
                    number: ch_no,
                });
            }
        }

        if vbi.pic_stop {
            stop_codes.insert(first_field_index);
        }
    }

    raw_chapters.push(Chapter {
        start_field: fields.len(),
        end_field: usize::MAX,
        number: -1,
    });

    let mut chapters: Vec<Chapter> = Vec::new();
    for i in 0..raw_chapters.len().saturating_sub(1) {
        let current = raw_chapters[i];
        let next = raw_chapters[i + 1];
        if next.start_field - current.start_field < MIN_CHAPTER_FIELDS {
            continue;
        }
        if chapters.last().map(|c| c.number) == Some(current.number) {
            continue;
        }
        chapters.push(current);
    }
    if let Some(&dummy) = raw_chapters.last() {
        chapters.push(dummy);
    }

    for i in 0..chapters.len().saturating_sub(1) {
        chapters[i].end_field = chapters[i + 1].start_field;
    }
    chapters.pop();

    NavigationInfo { chapters, stop_codes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vbi::decode::Vbi;

    fn field_with_chapter(ch_no: i32) -> (bool, Vbi) {
        let mut vbi = Vbi::default();
        vbi.ch_no = Some(ch_no);
        (true, vbi)
    }

    fn field_plain() -> (bool, Vbi) {
        (true, Vbi::default())
    }

    #[test]
    fn extracts_two_chapters_with_correct_bounds() {
        let mut fields = Vec::new();
        fields.extend((0..20).map(|_| field_with_chapter(1)));
        fields.extend((0..20).map(|_| field_with_chapter(2)));
        let nav = extract(&fields);
        assert_eq!(nav.chapters.len(), 2);
        assert_eq!(nav.chapters[0].number, 1);
        assert_eq!(nav.chapters[0].start_field, 0);
        assert_eq!(nav.chapters[0].end_field, 20);
        assert_eq!(nav.chapters[1].number, 2);
        assert_eq!(nav.chapters[1].end_field, 40);
    }

    #[test]
    fn drops_spurious_short_chapter_change() {
        let mut fields = Vec::new();
        fields.extend((0..20).map(|_| field_with_chapter(1)));
        fields.push(field_with_chapter(7)); // single corrupt glitch
        fields.extend((0..20).map(|_| field_with_chapter(1)));
        let nav = extract(&fields);
        assert_eq!(nav.chapters.len(), 1);
        assert_eq!(nav.chapters[0].number, 1);
    }

    #[test]
    fn collects_stop_codes() {
        let mut fields: Vec<(bool, Vbi)> = (0..15).map(|_| field_plain()).collect();
        let mut stop_vbi = Vbi::default();
        stop_vbi.pic_stop = true;
        fields[10] = (true, stop_vbi);
        let nav = extract(&fields);
        assert!(nav.stop_codes.contains(&10));
    }

    #[test]
    fn no_chapters_when_no_vbi_carries_one() {
        let fields: Vec<(bool, Vbi)> = (0..15).map(|_| field_plain()).collect();
        let nav = extract(&fields);
        assert!(nav.chapters.is_empty());
    }
}
