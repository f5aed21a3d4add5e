//! One-bit rolling-average digitizer (spec.md §5.1), grounded on
//! `OneBitADC.hpp`: each unsigned 8-bit RF sample is compared against
//! the rolling average of the last `window` samples, acting as a
//! primitive high-pass filter as a side effect of the comparison.

const DEFAULT_WINDOW: usize = 1000;

pub struct OneBitAdc {
    buffer: Vec<u8>,
    pos: usize,
    rolling_sum: i64,
}

impl OneBitAdc {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        const CENTER: u8 = 128;
        Self {
            buffer: vec![CENTER; window],
            pos: 0,
            rolling_sum: CENTER as i64 * window as i64,
        }
    }

    /// Digitize a run of unsigned samples, returning one 0/1 value per
    /// input sample: `1` when the sample is above the rolling average.
    pub fn process(&mut self, samples: &[u8]) -> Vec<u8> {
        samples.iter().map(|&sample| self.next(sample)).collect()
    }

    fn next(&mut self, sample: u8) -> u8 {
        let window = self.buffer.len() as i64;
        self.rolling_sum -= self.buffer[self.pos] as i64;
        self.buffer[self.pos] = sample;
        self.pos = (self.pos + 1) % self.buffer.len();
        self.rolling_sum += sample as i64;

        (sample as i64 > self.rolling_sum / window) as u8
    }
}

impl Default for OneBitAdc {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_input_settles_to_all_low() {
        let mut adc = OneBitAdc::new(8);
        let samples = vec![128u8; 64];
        let bits = adc.process(&samples);
        assert!(bits.iter().all(|&b| b == 0));
    }

    #[test]
    fn a_step_above_the_running_average_reads_high() {
        let mut adc = OneBitAdc::new(8);
        adc.process(&vec![100u8; 32]); // settle the average near 100
        let bits = adc.process(&[255, 255, 255]);
        assert!(bits.iter().all(|&b| b == 1));
    }

    #[test]
    fn output_length_matches_input_length() {
        let mut adc = OneBitAdc::new(16);
        let samples: Vec<u8> = (0..500).map(|i| (i % 256) as u8).collect();
        assert_eq!(adc.process(&samples).len(), samples.len());
    }
}
