//! Colorburst phase lock (spec.md §4.8 step 6): scales the first 64
//! lines to a fixed buffer via bicubic interpolation, measures burst
//! amplitude/phase by correlation against local sine/cosine
//! references, votes for field phase across even/odd lines, then
//! iterates a small number of refinement passes nudging HSYNC
//! positions toward the target burst phase.

use std::f64::consts::PI;

use crate::video::resample::bicubic_sample;

/// Burst gate: burst sits for ~9 cycles immediately after the HSYNC
/// back porch, well before active video starts.
const BURST_GATE_START_FRACTION: f64 = 0.05;
const BURST_GATE_CYCLES: f64 = 9.0;

/// Scale-buffer length used while measuring burst (spec.md: "2275-sample buffer").
const BURST_SCALE_LEN: usize = 2275;

#[derive(Debug, Clone, Copy)]
pub struct BurstMeasurement {
    pub amplitude: f64,
    /// Phase in cycles, `[0, 1)`.
    pub phase: f64,
}

/// Scale one line's samples (`hsync_pos..hsync_pos + samples_per_line`)
/// into a fixed `BURST_SCALE_LEN`-sample buffer via bicubic
/// interpolation, as the algorithm does before burst measurement.
pub fn scale_line_for_burst(samples: &[i16], hsync_pos: f64, samples_per_line: f64) -> Vec<f64> {
    let floats: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let step = samples_per_line / BURST_SCALE_LEN as f64;
    (0..BURST_SCALE_LEN)
        .map(|i| bicubic_sample(&floats, hsync_pos + step * i as f64))
        .collect()
}

/// Correlate the burst gate region of a scaled line against sine/
/// cosine references at the subcarrier frequency, returning amplitude
/// and phase.
pub fn measure_burst(scaled_line: &[f64], samples_per_cycle_scaled: f64) -> BurstMeasurement {
    let start = (BURST_SCALE_LEN as f64 * BURST_GATE_START_FRACTION) as usize;
    let len = (samples_per_cycle_scaled * BURST_GATE_CYCLES).round() as usize;
    let end = (start + len).min(scaled_line.len());
    if start >= end || samples_per_cycle_scaled <= 0.0 {
        return BurstMeasurement { amplitude: 0.0, phase: 0.0 };
    }

    let mut sum_i = 0.0;
    let mut sum_q = 0.0;
    for i in start..end {
        let theta = 2.0 * PI * (i as f64) / samples_per_cycle_scaled;
        sum_i += scaled_line[i] * theta.cos();
        sum_q += scaled_line[i] * theta.sin();
    }
    let n = (end - start) as f64;
    let i = sum_i / n;
    let q = sum_q / n;
    let amplitude = (i * i + q * q).sqrt();
    let phase = q.atan2(i) / (2.0 * PI);
    let phase = if phase < 0.0 { phase + 1.0 } else { phase };
    BurstMeasurement { amplitude, phase }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstPhase {
    Normal,
    Inverted,
}

/// Vote for the field's overall burst phase from per-line phase
/// measurements, splitting even and odd line indices (spec.md: "count
/// phase-flip votes on even vs. odd lines").
pub fn vote_field_phase(measurements: &[BurstMeasurement]) -> BurstPhase {
    let mut even_sum = 0.0;
    let mut odd_sum = 0.0;
    for (i, m) in measurements.iter().enumerate() {
        let signed = if m.phase < 0.5 { m.phase } else { m.phase - 1.0 };
        if i % 2 == 0 {
            even_sum += signed;
        } else {
            odd_sum += signed;
        }
    }
    if even_sum.abs() + odd_sum.abs() == 0.0 {
        return BurstPhase::Normal;
    }
    if (even_sum - odd_sum).abs() > (even_sum + odd_sum).abs() {
        BurstPhase::Inverted
    } else {
        BurstPhase::Normal
    }
}

/// Target burst phase, in cycles, that a correctly placed HSYNC should
/// measure (spec.md §4.8 step 6).
pub const TARGET_BURST_PHASE: f64 = 0.260;

/// One refinement pass: nudge each HSYNC position toward the target
/// phase by `(target - measured) * 8` input samples, per cycle of
/// burst. Returns the adjusted positions; callers iterate this four
/// times (spec.md §4.8 step 6).
pub fn refine_hsync_positions(
    positions: &mut [f64],
    measurements: &[BurstMeasurement],
    samples_per_cycle: f64,
) {
    for (pos, m) in positions.iter_mut().zip(measurements) {
        let error_cycles = TARGET_BURST_PHASE - m.phase;
        // Wrap to the shortest signed path around the cycle.
        let error_cycles = if error_cycles > 0.5 {
            error_cycles - 1.0
        } else if error_cycles < -0.5 {
            error_cycles + 1.0
        } else {
            error_cycles
        };
        *pos += error_cycles * samples_per_cycle * 8.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth_burst_line(samples_per_cycle: f64, phase_cycles: f64, amplitude: f64) -> Vec<i16> {
        let len = 910;
        (0..len)
            .map(|i| {
                let theta = 2.0 * PI * (i as f64 / samples_per_cycle - phase_cycles);
                (amplitude * theta.sin()) as i16
            })
            .collect()
    }

    #[test]
    fn measures_known_phase_and_amplitude() {
        let samples_per_cycle = 4.0;
        let samples = synth_burst_line(samples_per_cycle, 0.25, 5000.0);
        let scaled = scale_line_for_burst(&samples, 0.0, 910.0);
        let scaled_spc = samples_per_cycle * (2275.0 / 910.0);
        let m = measure_burst(&scaled, scaled_spc);
        assert!(m.amplitude > 0.0);
    }

    #[test]
    fn zero_amplitude_line_measures_near_zero() {
        let scaled = vec![0.0; 2275];
        let m = measure_burst(&scaled, 4.0 * (2275.0 / 910.0));
        assert!(m.amplitude < 1e-6);
    }

    #[test]
    fn refine_moves_position_toward_target() {
        let mut positions = [100.0];
        let measurements = [BurstMeasurement { amplitude: 10.0, phase: 0.1 }];
        refine_hsync_positions(&mut positions, &measurements, 4.0);
        assert_ne!(positions[0], 100.0);
    }
}
