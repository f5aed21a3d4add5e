//! Per-field metadata record (spec.md §3 "Navigation info" + §6 JSON
//! schema): the structured record the core hands to an external
//! writer. The table names spec.md §6 lists (`capture`,
//! `pcm_audio_parameters`, `field_record`, `vbi`, `vits_metrics`,
//! `vitc`, `closed_caption`, `drop_outs`) become field groups on one
//! `serde`-serializable struct rather than separate SQL tables:
//! relational/file export is external-collaborator territory per
//! spec.md §1, so the core only needs to hand over the data, not
//! shape it into rows.

use serde::{Deserialize, Serialize};

use crate::config::{CaptureConfig, VideoStandard};
use crate::vbi::decode::Vbi;
use crate::video::dropout::DropoutRun;

/// `capture` table: the RF source this metadata was decoded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureInfo {
    pub sample_rate_hz: f64,
    pub standard: VideoStandard,
}

impl CaptureInfo {
    pub fn from_config(capture: &CaptureConfig, standard: VideoStandard) -> Self {
        Self {
            sample_rate_hz: capture.sample_rate_hz,
            standard,
        }
    }
}

/// `pcm_audio_parameters` table: fixed CD-DA PCM layout, carried so a
/// writer doesn't need to re-derive it from the sector/audio stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PcmAudioParameters {
    pub sample_rate_hz: u32,
    pub bits_per_sample: u8,
    pub channels: u8,
}

impl Default for PcmAudioParameters {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44_100,
            bits_per_sample: 16,
            channels: 2,
        }
    }
}

/// `vits_metrics` table: video-in-service-test-signal quality metrics.
/// The TBC core here doesn't compute VITS (no test-signal line is
/// decoded by the §4.8 stage chain); the field exists so a writer has
/// somewhere to put them if an external VITS analyzer supplies them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct VitsMetrics {
    pub white_snr_db: Option<f64>,
    pub black_line_snr_db: Option<f64>,
}

/// `vitc` table: vertical-interval time code, when present. Not
/// decoded by this core (no VITC line demodulator in spec.md §4.8);
/// reserved for an external VITC reader's output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Vitc {
    pub hours: Option<u8>,
    pub minutes: Option<u8>,
    pub seconds: Option<u8>,
    pub frames: Option<u8>,
}

/// `closed_caption` table: raw line-21 CC byte pair. Actual CEA-608
/// decode is external-collaborator territory (spec.md §1's
/// `ld-export-metadata`/`closedcaptions.cpp` precedent); the core only
/// carries the bytes through if an external line-21 reader supplies
/// them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ClosedCaption {
    pub byte_pair: Option<(u8, u8)>,
}

/// One `drop_outs` row: a run of dropout samples on one field line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DropOutRecord {
    pub line: usize,
    pub start_sample: usize,
    pub length: usize,
}

impl From<&DropoutRun> for DropOutRecord {
    fn from(run: &DropoutRun) -> Self {
        Self {
            line: run.line,
            start_sample: run.start,
            length: run.len,
        }
    }
}

/// `field_record` table plus its nested `vbi`/`vits_metrics`/`vitc`/
/// `closed_caption`/`drop_outs` groups: the complete per-field record
/// spec.md §3 describes, covering one decoded video field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRecord {
    pub field_number: u64,
    pub is_first_field: bool,
    /// Disc time in frames (MM:SS:FF) carried from the EFM subcode
    /// layer, when the audio and video streams share a disc (spec.md
    /// §5 "alignment is maintained by disc-time metadata").
    pub disc_time: Option<(u8, u8, u8)>,
    pub vbi: Vbi,
    pub vits: VitsMetrics,
    pub vitc: Vitc,
    pub closed_caption: ClosedCaption,
    pub drop_outs: Vec<DropOutRecord>,
}

impl FieldRecord {
    pub fn new(field_number: u64, is_first_field: bool, vbi: Vbi, dropouts: &[DropoutRun]) -> Self {
        Self {
            field_number,
            is_first_field,
            disc_time: None,
            vbi,
            vits: VitsMetrics::default(),
            vitc: Vitc::default(),
            closed_caption: ClosedCaption::default(),
            drop_outs: dropouts.iter().map(DropOutRecord::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::dropout::DropoutRun;

    #[test]
    fn field_record_carries_dropouts_with_its_own_line_number() {
        let runs = vec![DropoutRun { line: 5, start: 10, len: 20 }];
        let record = FieldRecord::new(42, true, Vbi::default(), &runs);
        assert_eq!(record.drop_outs.len(), 1);
        assert_eq!(record.drop_outs[0].line, 5);
        assert_eq!(record.drop_outs[0].start_sample, 10);
        assert_eq!(record.drop_outs[0].length, 20);
    }

    #[test]
    fn pcm_audio_parameters_default_matches_cd_da() {
        let params = PcmAudioParameters::default();
        assert_eq!(params.sample_rate_hz, 44_100);
        assert_eq!(params.bits_per_sample, 16);
        assert_eq!(params.channels, 2);
    }
}
