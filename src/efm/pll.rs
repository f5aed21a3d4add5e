//! Bit-cell-recovery PLL: recovers T-values (channel run lengths, 3-11)
//! from a zero-crossing RF waveform via phase/frequency feedback.
//!
//! Algorithm and constants reproduced from the reference zero-crossing
//! PLL (direction-debounced crossing detection, sub-sample linear
//! interpolation of the crossing fraction, and a hysteresis-gated
//! period adjustment), generalized over the sample-rate/bit-rate ratio
//! instead of hardcoding the 40 MSPS / 4.3218 Mbit/s EFM case.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    None,
    Up,
    Down,
}

pub struct Pll {
    sample_rate_hz: f64,
    channel_bit_rate_hz: f64,
    base_period: f64,
    minimum_period: f64,
    maximum_period: f64,
    period_adjust_base: f64,
    current_period: f64,
    frequency_hysteresis: i32,
    phase_adjust: f64,
    ref_clock_time: f64,
    t_counter: u32,

    zc_previous_input: i32,
    prev_direction: Direction,
    delta: f64,
    first_run: bool,

    t_values: Vec<u32>,
}

impl Pll {
    /// `sample_rate_hz` / `channel_bit_rate_hz` sets the nominal
    /// samples-per-channel-bit ratio the loop locks onto.
    pub fn new(sample_rate_hz: f64, channel_bit_rate_hz: f64) -> Self {
        let base_period = sample_rate_hz / channel_bit_rate_hz;
        Self {
            sample_rate_hz,
            channel_bit_rate_hz,
            base_period,
            minimum_period: base_period * 0.90,
            maximum_period: base_period * 1.10,
            period_adjust_base: base_period * 0.0001,
            current_period: base_period,
            frequency_hysteresis: 0,
            phase_adjust: 0.0,
            ref_clock_time: 0.0,
            t_counter: 1,
            zc_previous_input: 0,
            prev_direction: Direction::None,
            delta: 0.0,
            first_run: true,
            t_values: Vec::new(),
        }
    }

    pub fn current_period(&self) -> f64 {
        self.current_period
    }

    /// Feed a chunk of signed samples, returning the T-values (channel
    /// bit-cell run lengths) recovered from this chunk. State (zero
    /// crossing position, PLL phase/period) persists across calls.
    pub fn process(&mut self, samples: &[i16]) -> Vec<u32> {
        self.t_values.clear();
        for &sample in samples {
            let value = sample as i32;
            if self.first_run {
                self.zc_previous_input = value;
                self.first_run = false;
                continue;
            }

            let prev = self.zc_previous_input;
            let up = prev < 0 && value >= 0;
            let down = prev >= 0 && value < 0;

            let crossed = (up && self.prev_direction != Direction::Up)
                || (down && self.prev_direction != Direction::Down);

            if crossed {
                let fraction = (-prev as f64) / ((value - prev) as f64);
                self.push_edge(self.delta + fraction);
                self.delta = 1.0 - fraction;
                self.prev_direction = if up { Direction::Up } else { Direction::Down };
            } else {
                self.delta += 1.0;
                self.prev_direction = Direction::None;
            }

            self.zc_previous_input = value;
        }
        std::mem::take(&mut self.t_values)
    }

    fn push_t_value(&mut self, bit: bool) {
        if bit {
            self.t_values.push(self.t_counter);
            self.t_counter = 1;
        } else {
            self.t_counter += 1;
        }
    }

    fn push_edge(&mut self, sample_delta: f64) {
        while sample_delta >= self.ref_clock_time {
            let next = self.ref_clock_time + self.current_period + self.phase_adjust;
            self.ref_clock_time = next;

            if (sample_delta > next || self.t_counter < 3) && self.t_counter <= 10 {
                self.phase_adjust = 0.0;
                self.push_t_value(false);
            } else {
                let delta = sample_delta - (next - self.current_period / 2.0);
                self.phase_adjust = delta * 0.005;

                if delta > 0.0 {
                    self.frequency_hysteresis =
                        if self.frequency_hysteresis > 0 { self.frequency_hysteresis + 1 } else { 1 };
                } else if delta < 0.0 {
                    self.frequency_hysteresis =
                        if self.frequency_hysteresis < 0 { self.frequency_hysteresis - 1 } else { -1 };
                } else {
                    self.frequency_hysteresis = 0;
                }

                if self.frequency_hysteresis.abs() > 1 {
                    self.current_period = (self.current_period
                        + self.period_adjust_base * delta / self.current_period)
                        .clamp(self.minimum_period, self.maximum_period);
                }

                self.push_t_value(true);
            }
        }
        self.ref_clock_time -= sample_delta;
    }

    /// Reinitialize all loop state, preserving the configured sample/bit rate.
    pub fn reset(&mut self) {
        *self = Self::new(self.sample_rate_hz, self.channel_bit_rate_hz);
    }
}
