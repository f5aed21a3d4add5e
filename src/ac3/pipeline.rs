//! Top-level AC-3 pipeline (spec.md §2/§4.7): wires the 1-bit ADC, QPSK
//! demodulator, reclocker, frame/block assemblers, two-pass
//! Reed-Solomon corrector, and sync-frame validator into one streaming
//! `feed`/statistics API, mirroring [`crate::efm::pipeline::Pipeline`]'s
//! shape for the parallel channel decode chain.

use crate::ac3::adc::OneBitAdc;
use crate::ac3::blocker::Blocker;
use crate::ac3::corrector::Corrector;
use crate::ac3::demodulator::QpskDemodulator;
use crate::ac3::framer::QpskFramer;
use crate::ac3::reclocker::Reclocker;
use crate::ac3::syncframe::{SyncFrame, SyncFrameExtractor};
use crate::config::Ac3Config;

#[derive(Debug, Default, Clone)]
pub struct Ac3Output {
    pub frames: Vec<SyncFrame>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Statistics {
    pub framer: crate::ac3::framer::Statistics,
    pub blocker: crate::ac3::blocker::Statistics,
    pub corrector: crate::ac3::corrector::Statistics,
    pub syncframe: crate::ac3::syncframe::Statistics,
}

pub struct Pipeline {
    adc: OneBitAdc,
    demod: QpskDemodulator,
    reclocker: Reclocker,
    framer: QpskFramer,
    blocker: Blocker,
    corrector: Corrector,
    syncframe: SyncFrameExtractor,
}

impl Pipeline {
    pub fn new(config: &Ac3Config) -> Self {
        Self {
            adc: OneBitAdc::default(),
            demod: QpskDemodulator::new(),
            reclocker: Reclocker::new(config.capture.sample_rate_hz),
            framer: QpskFramer::new(),
            blocker: Blocker::new(),
            corrector: Corrector::new(),
            syncframe: SyncFrameExtractor::new(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            framer: self.framer.statistics(),
            blocker: self.blocker.statistics(),
            corrector: self.corrector.statistics(),
            syncframe: self.syncframe.statistics(),
        }
    }

    /// Feed a chunk of unsigned 8-bit RF samples, returning every
    /// validated AC-3 sync frame decodable from it plus any data
    /// buffered from prior calls. All stage state persists across
    /// calls.
    pub fn feed(&mut self, samples: &[u8]) -> Ac3Output {
        let bits = self.adc.process(samples);
        let votes = self.demod.process(&bits);
        let symbols = self.reclocker.process(&votes);
        let qpsk_frames = self.framer.process(&symbols);
        let blocks = self.blocker.process(&qpsk_frames);

        let mut output = Ac3Output::default();
        for block in &blocks {
            let payload = self.corrector.decode(block);
            output.frames.extend(self.syncframe.process(&payload));
        }
        output
    }
}
