//! Top-level EFM pipeline (spec.md §2/§6): wires the PLL, F3 assembler,
//! section synchronizer, CIRC decoder, F1 deinterleaver, and the
//! sector/audio dispatchers into one streaming `feed`/statistics API.

use crate::config::EfmConfig;
use crate::efm::audio::F1ToAudio;
use crate::efm::circ::CircDecoder;
use crate::efm::f1::F1Deinterleaver;
use crate::efm::f3::F3Assembler;
use crate::efm::pll::Pll;
use crate::efm::sector::{Sector, SectorSync};
use crate::efm::section::SectionSync;

#[derive(Debug, Default, Clone)]
pub struct EfmOutput {
    pub sectors: Vec<Sector>,
    /// Interleaved 16-bit stereo PCM bytes, little-endian.
    pub audio: Vec<u8>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Statistics {
    pub f3: crate::efm::f3::Statistics,
    pub section: crate::efm::section::Statistics,
    pub circ: crate::efm::circ::Statistics,
    pub sector: crate::efm::sector::Statistics,
    pub audio: crate::efm::audio::Statistics,
}

pub struct Pipeline {
    pll: Pll,
    f3: F3Assembler,
    section_sync: SectionSync,
    circ: CircDecoder,
    f1_deint: F1Deinterleaver,
    sector_sync: SectorSync,
    audio: F1ToAudio,
}

impl Pipeline {
    pub fn new(config: &EfmConfig) -> Self {
        Self {
            pll: Pll::new(config.capture.sample_rate_hz, config.channel_bit_rate_hz),
            f3: F3Assembler::new(),
            section_sync: SectionSync::new(),
            circ: CircDecoder::new(),
            f1_deint: F1Deinterleaver::new(),
            sector_sync: SectorSync::new(),
            audio: F1ToAudio::new(config.audio_error_treatment, config.concealment),
        }
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            f3: self.f3.statistics(),
            section: self.section_sync.statistics(),
            circ: self.circ.statistics(),
            sector: self.sector_sync.statistics(),
            audio: self.audio.statistics(),
        }
    }

    /// Feed a chunk of signed RF samples, returning every sector and
    /// audio byte decodable from it plus any data buffered from prior
    /// calls. All stage state persists across calls.
    pub fn feed(&mut self, samples: &[i16]) -> EfmOutput {
        let t_values = self.pll.process(samples);
        let f3_frames = self.f3.process(&t_values);
        let sections = self.section_sync.process(&f3_frames);

        let mut output = EfmOutput::default();
        for section in &sections {
            let f2_frames = self.circ.decode(section);
            let f1_frames = self.f1_deint.process(&f2_frames);
            output.sectors.extend(self.sector_sync.process(&f1_frames));
            output.audio.extend(self.audio.process(&f1_frames));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EfmConfig;

    #[test]
    fn empty_input_produces_no_output_and_no_panic() {
        let mut pipeline = Pipeline::new(&EfmConfig::default());
        let output = pipeline.feed(&[]);
        assert!(output.sectors.is_empty());
        assert!(output.audio.is_empty());
    }

    #[test]
    fn noise_input_does_not_panic_and_leaves_stages_hunting() {
        let mut pipeline = Pipeline::new(&EfmConfig::default());
        let samples: Vec<i16> = (0..50_000)
            .map(|i| if i % 7 == 0 { 12000 } else { -12000 })
            .collect();
        let output = pipeline.feed(&samples);
        // Random-ish toggling is very unlikely to ever satisfy F3 sync,
        // CIRC, and sector sync all at once; the call must still be safe.
        assert!(output.sectors.len() < 2);
    }
}
