//! Symbol-clock recovery (spec.md §5.3), grounded on `Reclocker.hpp`:
//! an NCO driven by a nominal add-value, trimmed by a proportional-
//! integral filter derived from the midpoint of the toggle positions
//! seen within each NCO period, decimating the demodulator's
//! oversampled vote stream down to one symbol per QPSK baud.

const COUNTER_BITS: u32 = 16;
const COUNTER_MASK: u32 = (1 << COUNTER_BITS) - 1;
/// QPSK eye-pattern clock, Hz (PD4606A pin 85 EPCK per the SDP-EP9ES
/// service manual referenced by the original implementation).
const NOMINAL_FREQUENCY_HZ: f64 = 288_000.0;
const MAX_ERROR_SUM: i64 = 0x7ffff;
const MIN_ERROR_SUM: i64 = -0x80000;

pub struct Reclocker {
    nominal_add: u32,
    clk_counter: u32,
    last_in: u8,
    error_sum: i64,
    filter_out: i64,
    toggle_positions: Vec<u32>,
}

impl Reclocker {
    /// `sample_rate_hz` is the rate of the incoming (oversampled) vote
    /// stream, i.e. the ADC/demodulator sample rate.
    pub fn new(sample_rate_hz: f64) -> Self {
        let nominal_add = (((1u64 << COUNTER_BITS) as f64 * NOMINAL_FREQUENCY_HZ) / sample_rate_hz) as u32;
        Self {
            nominal_add,
            clk_counter: 0,
            last_in: 0,
            error_sum: 0,
            filter_out: 0,
            toggle_positions: Vec::new(),
        }
    }

    /// Feed a run of demodulator votes, returning the decimated symbol
    /// for every NCO period that completed within this call.
    pub fn process(&mut self, votes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for &vote in votes {
            if vote != self.last_in {
                self.toggle_positions.push(self.clk_counter);
                self.last_in = vote;
            }

            let filter_now = if self.filter_out < -(self.nominal_add as i64) {
                self.filter_out += self.nominal_add as i64;
                -(self.nominal_add as i64)
            } else {
                let f = self.filter_out;
                self.filter_out = 0;
                f
            };

            let new_counter = ((self.clk_counter as i64 + self.nominal_add as i64 + filter_now)
                as u32)
                & COUNTER_MASK;

            if new_counter < self.clk_counter {
                if let (Some(&first), Some(&last)) =
                    (self.toggle_positions.first(), self.toggle_positions.last())
                {
                    let toggle_pos = (first + last) / 2;
                    let error = -(toggle_pos as i64 - (1i64 << (COUNTER_BITS - 1)));
                    if error > 0 && self.error_sum + error > MAX_ERROR_SUM {
                        self.error_sum = MAX_ERROR_SUM;
                    } else if error < 0 && self.error_sum + error < MIN_ERROR_SUM {
                        self.error_sum = MIN_ERROR_SUM;
                    } else {
                        self.error_sum += error;
                    }
                    self.filter_out = error / 128 + self.error_sum / (1 << 12);
                } else {
                    self.filter_out = self.error_sum / (1 << 12);
                }
                self.toggle_positions.clear();
                self.clk_counter = new_counter;
                out.push(self.last_in);
            } else {
                self.clk_counter = new_counter;
            }
        }
        out
    }
}
