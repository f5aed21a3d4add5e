//! VBI (vertical blanking interval) field-data decode, per IEC
//! 60857-1986 §10.1 and its Amendment 2 extensions. Each field carries
//! up to three 24-bit Manchester-coded words on lines 16-18; this
//! module turns those words into the structured disc/programme
//! metadata they encode.

use serde::{Deserialize, Serialize};

/// Disc addressing mode signalled by the VBI, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiscType {
    #[default]
    Unknown,
    Cav,
    Clv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SoundMode {
    Stereo,
    Mono,
    #[default]
    FutureUse,
    Bilingual,
    StereoStereo,
    StereoBilingual,
    CrossChannelStereo,
    BilingualBilingual,
    MonoDump,
    StereoDump,
    BilingualDump,
}

/// One field's decoded VBI state. Absent numeric fields are `None`
/// rather than the original decoder's sentinel `-1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vbi {
    pub disc_type: DiscType,
    pub user_code: Option<String>,
    pub pic_no: Option<i32>,
    pub ch_no: Option<i32>,
    pub clv_hr: Option<i32>,
    pub clv_min: Option<i32>,
    pub clv_sec: Option<i32>,
    pub clv_pic_no: Option<i32>,
    pub sound_mode: SoundMode,
    pub sound_mode_am2: SoundMode,
    pub lead_in: bool,
    pub lead_out: bool,
    pub pic_stop: bool,
    pub cx: bool,
    pub size_12_inch: bool,
    pub side_one: bool,
    pub teletext: bool,
    pub dump: bool,
    pub fm: bool,
    pub digital: bool,
    pub parity_ok: bool,
    pub copy_am2: bool,
    pub standard_am2: bool,
}

/// Decode a BCD-packed number. Returns `None` if any nibble isn't a
/// valid decimal digit (0-9).
pub fn decode_bcd(bcd: u32) -> Option<i32> {
    let mut value = 0i32;
    let mut place = 1i32;
    let mut bcd = bcd;
    while bcd != 0 {
        let digit = bcd & 0xF;
        if digit > 9 {
            return None;
        }
        value += digit as i32 * place;
        place *= 10;
        bcd >>= 4;
    }
    Some(value)
}

/// Verify the three parity bits (X51/X52/X53) carried alongside the
/// X41-X44 audio/status nibble of a programme status code.
fn parity(x4: u32, x5: u32) -> bool {
    let x51 = (x5 & 0x8) != 0;
    let x52 = (x5 & 0x4) != 0;
    let x53 = (x5 & 0x2) != 0;

    let x41 = (x4 & 0x8) != 0;
    let x42 = (x4 & 0x4) != 0;
    let x43 = (x4 & 0x2) != 0;
    let x44 = (x4 & 0x1) != 0;

    let check = |bits: &[bool], parity_bit: bool| -> bool {
        let count = bits.iter().filter(|&&b| b).count();
        (count % 2 == 0) == !parity_bit
    };

    check(&[x41, x42, x44], x51) && check(&[x41, x43, x44], x52) && check(&[x42, x43, x44], x53)
}

fn audio_status_sound_mode(status: u32) -> (bool, bool, SoundMode) {
    match status {
        0 => (false, false, SoundMode::Stereo),
        1 => (false, false, SoundMode::Mono),
        2 => (false, false, SoundMode::FutureUse),
        3 => (false, false, SoundMode::Bilingual),
        4 => (false, true, SoundMode::StereoStereo),
        5 => (false, true, SoundMode::StereoBilingual),
        6 => (false, true, SoundMode::CrossChannelStereo),
        7 => (false, true, SoundMode::BilingualBilingual),
        8 | 9 | 11 => (true, false, SoundMode::MonoDump),
        10 => (true, false, SoundMode::FutureUse),
        12 | 13 => (true, true, SoundMode::StereoDump),
        14 | 15 => (true, true, SoundMode::BilingualDump),
        _ => (false, false, SoundMode::Stereo),
    }
}

fn audio_status_am2(status: u32) -> (bool, SoundMode) {
    match status {
        0 => (true, SoundMode::Stereo),
        1 => (true, SoundMode::Mono),
        3 => (true, SoundMode::Bilingual),
        8 => (true, SoundMode::MonoDump),
        _ => (false, SoundMode::FutureUse),
    }
}

/// Decode one field's three VBI words (spec.md §4.9 "VBI decode").
/// A word of `None` means that line's Manchester decode found no
/// start transition (see [`crate::video::vbi_demod::decode_vbi_line`]).
pub fn decode(vbi16: Option<u32>, vbi17: Option<u32>, vbi18: Option<u32>) -> Vbi {
    let mut vbi = Vbi::default();
    let vbi16 = vbi16.unwrap_or(0);
    let vbi17 = vbi17.unwrap_or(0);
    let vbi18 = vbi18.unwrap_or(0);

    if vbi17 == 0x88FFFF || vbi18 == 0x88FFFF {
        vbi.lead_in = true;
    }
    if vbi17 == 0x80EEEE || vbi18 == 0x80EEEE {
        vbi.lead_out = true;
    }

    for word in [vbi17, vbi18] {
        if word & 0xF0_0000 == 0xF0_0000 {
            if let Some(pic_no) = decode_bcd(word & 0x07_FFFF) {
                vbi.pic_no = Some(pic_no);
                vbi.disc_type = DiscType::Cav;
            }
        }
    }

    if vbi16 == 0x82CFFF || vbi17 == 0x82CFFF {
        vbi.disc_type = DiscType::Cav;
        vbi.pic_stop = true;
    }

    for word in [vbi17, vbi18] {
        if word & 0xF0_0FFF == 0x80_0DDD {
            if let Some(ch_no) = decode_bcd((word & 0x07_F000) >> 12) {
                vbi.ch_no = Some(ch_no);
            }
        }
    }

    for word in [vbi17, vbi18] {
        if word & 0xF0_FF00 == 0xF0_DD00 {
            if let (Some(hour), Some(min)) =
                (decode_bcd((word & 0x0F_0000) >> 16), decode_bcd(word & 0x00_00FF))
            {
                vbi.clv_hr = Some(hour);
                vbi.clv_min = Some(min);
            }
        }
    }
    if vbi.clv_hr.is_some() {
        vbi.disc_type = DiscType::Clv;
    }
    if vbi17 == 0x87FFFF {
        vbi.disc_type = DiscType::Clv;
    }

    let status_code = if vbi16 & 0xFFF000 == 0x8DC000 || vbi16 & 0xFFF000 == 0x8BA000 {
        Some(vbi16)
    } else {
        None
    };
    if let Some(status) = status_code {
        vbi.cx = status & 0x0FF000 == 0x0DC000;
        let x3 = (status & 0x000F00) >> 8;
        let x4 = (status & 0x0000F0) >> 4;
        let x5 = status & 0x00000F;

        vbi.parity_ok = parity(x4, x5);
        vbi.size_12_inch = x3 & 0x08 == 0;
        vbi.side_one = x3 & 0x04 == 0;
        vbi.teletext = x3 & 0x02 != 0;
        vbi.digital = x4 & 0x04 != 0;

        let mut audio_status = 0u32;
        if x4 & 0x08 != 0 {
            audio_status += 8;
        }
        if x3 & 0x01 != 0 {
            audio_status += 4;
        }
        if x4 & 0x02 != 0 {
            audio_status += 2;
        }
        if x4 & 0x01 != 0 {
            audio_status += 1;
        }
        let (dump, fm, sound_mode) = audio_status_sound_mode(audio_status);
        vbi.dump = dump;
        vbi.fm = fm;
        vbi.sound_mode = sound_mode;

        // The Am2 code reuses the same x3/x4 nibbles.
        vbi.copy_am2 = x3 & 0x01 != 0;
        let mut audio_status_am2_code = 0u32;
        if x4 & 0x08 != 0 {
            audio_status_am2_code += 8;
        }
        if x4 & 0x04 != 0 {
            audio_status_am2_code += 4;
        }
        if x4 & 0x02 != 0 {
            audio_status_am2_code += 2;
        }
        if x4 & 0x01 != 0 {
            audio_status_am2_code += 1;
        }
        let (standard_am2, sound_mode_am2) = audio_status_am2(audio_status_am2_code);
        vbi.standard_am2 = standard_am2;
        vbi.sound_mode_am2 = sound_mode_am2;
    }

    if vbi16 & 0xF0F000 == 0x80D000 {
        let x1 = (vbi16 & 0x0F0000) >> 16;
        let x3x4x5 = vbi16 & 0x000FFF;
        vbi.user_code = Some(format!("{:X}{:X}", x1, x3x4x5));
    }

    if vbi16 & 0xF0F000 == 0x80E000 {
        let x1 = (vbi16 & 0x0F0000) >> 16;
        let sec_digit = (vbi16 & 0x000F00) >> 8;
        if x1 >= 0xA {
            if let (Some(sec), Some(clv_pic_no)) = (decode_bcd(sec_digit), decode_bcd(vbi16 & 0x0000FF)) {
                vbi.clv_sec = Some(10 * (x1 as i32 - 0xA) + sec);
                vbi.clv_pic_no = Some(clv_pic_no);
                vbi.disc_type = DiscType::Clv;
                vbi.pic_no = None;
            }
        }
    }

    vbi
}

fn first_non_default<T: PartialEq + Default + Clone>(a: T, b: T) -> T {
    if a != T::default() {
        a
    } else {
        b
    }
}

/// Merge a frame's two fields' decoded VBI into one record: numeric
/// fields take whichever field set them (first field wins ties),
/// boolean flags OR together.
pub fn decode_frame(first: &Vbi, second: &Vbi) -> Vbi {
    Vbi {
        disc_type: if first.disc_type != DiscType::Unknown {
            first.disc_type
        } else {
            second.disc_type
        },
        user_code: first.user_code.clone().or_else(|| second.user_code.clone()),
        pic_no: first.pic_no.or(second.pic_no),
        ch_no: first.ch_no.or(second.ch_no),
        clv_hr: first.clv_hr.or(second.clv_hr),
        clv_min: first.clv_min.or(second.clv_min),
        clv_sec: first.clv_sec.or(second.clv_sec),
        clv_pic_no: first.clv_pic_no.or(second.clv_pic_no),
        sound_mode: first_non_default(first.sound_mode, second.sound_mode),
        sound_mode_am2: first_non_default(first.sound_mode_am2, second.sound_mode_am2),
        lead_in: first.lead_in || second.lead_in,
        lead_out: first.lead_out || second.lead_out,
        pic_stop: first.pic_stop || second.pic_stop,
        cx: first.cx || second.cx,
        size_12_inch: first.size_12_inch || second.size_12_inch,
        side_one: first.side_one || second.side_one,
        teletext: first.teletext || second.teletext,
        dump: first.dump || second.dump,
        fm: first.fm || second.fm,
        digital: first.digital || second.digital,
        parity_ok: first.parity_ok || second.parity_ok,
        copy_am2: first.copy_am2 || second.copy_am2,
        standard_am2: first.standard_am2 || second.standard_am2,
    }
}
