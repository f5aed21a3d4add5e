//! Drives [`vbi::decode`], [`vbi::navigation::extract`], and
//! [`metadata::FieldRecord`] together over a synthetic run of fields,
//! the way an external writer would turn a video pipeline's per-field
//! VBI words into navigation info and serializable metadata (spec.md
//! §3/§6, P6).

use ldcapture_core::metadata::FieldRecord;
use ldcapture_core::vbi::decode::{decode, DiscType, Vbi};
use ldcapture_core::vbi::navigation::extract;
use ldcapture_core::video::dropout::DropoutRun;

/// Packs a decimal value into BCD nibbles, least-significant digit first.
fn bcd_encode(mut value: u32) -> u32 {
    let mut result = 0u32;
    let mut shift = 0;
    if value == 0 {
        return 0;
    }
    while value > 0 {
        result |= (value % 10) << shift;
        shift += 4;
        value /= 10;
    }
    result
}

/// CAV picture-number word: nibble `F` flag plus a 5-digit BCD number.
fn picture_word(pic_no: u32) -> u32 {
    0xF0_0000 | bcd_encode(pic_no)
}

/// Chapter-number word (`80 1 DDD` pattern per `decode`'s X.1DDD match).
fn chapter_word(ch_no: u8) -> u32 {
    0x80_0DDD | ((ch_no as u32) << 12)
}

#[test]
fn chapter_run_survives_navigation_and_serializes_into_field_records() {
    let mut fields: Vec<(bool, Vbi)> = Vec::new();
    let mut records: Vec<FieldRecord> = Vec::new();

    for i in 0..20u32 {
        let vbi = decode(None, Some(chapter_word(1)), Some(picture_word(i)));
        fields.push((true, vbi.clone()));
        records.push(FieldRecord::new(i as u64, true, vbi, &[]));
    }
    for i in 20..40u32 {
        let vbi = decode(None, Some(chapter_word(2)), Some(picture_word(i)));
        fields.push((true, vbi.clone()));
        records.push(FieldRecord::new(i as u64, true, vbi, &[]));
    }

    let nav = extract(&fields);
    assert_eq!(nav.chapters.len(), 2);
    assert_eq!(nav.chapters[0].number, 1);
    assert_eq!(nav.chapters[0].start_field, 0);
    assert_eq!(nav.chapters[0].end_field, 20);
    assert_eq!(nav.chapters[1].number, 2);
    assert_eq!(nav.chapters[1].start_field, 20);

    assert_eq!(records.len(), 40);
    assert_eq!(records[0].vbi.ch_no, Some(1));
    assert_eq!(records[25].vbi.ch_no, Some(2));
    assert_eq!(records[0].vbi.disc_type, DiscType::Cav);

    let encoded = toml::to_string(&records[0]).expect("FieldRecord must serialize");
    let back: FieldRecord = toml::from_str(&encoded).expect("FieldRecord must round-trip");
    assert_eq!(back.vbi.ch_no, records[0].vbi.ch_no);
    assert_eq!(back.field_number, records[0].field_number);
}

#[test]
fn dropouts_attach_to_their_own_field_record() {
    let runs = vec![
        DropoutRun { line: 12, start: 100, len: 30 },
        DropoutRun { line: 200, start: 0, len: 5 },
    ];
    let record = FieldRecord::new(7, false, Vbi::default(), &runs);
    assert_eq!(record.drop_outs.len(), 2);
    assert_eq!(record.drop_outs[1].line, 200);
    assert_eq!(record.drop_outs[1].length, 5);
    assert!(!record.is_first_field);
}
