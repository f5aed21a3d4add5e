//! VBI line Manchester demodulation (spec.md §4.8, step 8): turns a
//! resampled VBI line (16, 17, or 18) into a 24-bit code.

/// IRE threshold separating Manchester "high" from "low".
const LOGIC_THRESHOLD_IRE: f64 = 50.0;

/// Samples to skip before hunting for the first start transition
/// (spec.md: "after the first ~70 samples").
const LEAD_IN_SAMPLES: usize = 70;

const CODE_BITS: u32 = 24;

/// Decode one resampled VBI line (already expressed as per-sample IRE
/// values) into its 24-bit Manchester code. Returns `0` if no start
/// transition is found (spec.md §8 boundary behavior).
pub fn decode_vbi_line(line_ire: &[f64], output_line_width: usize, line_duration_seconds: f64) -> u32 {
    if line_ire.len() < LEAD_IN_SAMPLES + 1 {
        return 0;
    }
    let samples_per_us = output_line_width as f64 / (line_duration_seconds * 1_000_000.0);
    let bit_period = 1.5 * samples_per_us;
    if bit_period <= 0.0 {
        return 0;
    }

    let level_at = |pos: f64| -> bool {
        let idx = pos.round().clamp(0.0, (line_ire.len() - 1) as f64) as usize;
        line_ire[idx] > LOGIC_THRESHOLD_IRE
    };

    // First positive transition (low -> high) after the lead-in.
    let mut start = None;
    for i in LEAD_IN_SAMPLES..line_ire.len() - 1 {
        if !level_at(i as f64) && level_at((i + 1) as f64) {
            start = Some(i as f64 + 1.0);
            break;
        }
    }
    let Some(start) = start else {
        return 0;
    };

    let mut code: u32 = 0;
    for bit_index in 0..CODE_BITS {
        let cell_start = start + bit_index as f64 * bit_period;
        let first_half = cell_start + bit_period * 0.25;
        let second_half = cell_start + bit_period * 0.75;
        if first_half >= line_ire.len() as f64 {
            break;
        }
        let a = level_at(first_half);
        let b = level_at(second_half);
        // Manchester: 01 (rising within the cell) = 1, 10 (falling) = 0.
        let bit = match (a, b) {
            (false, true) => 1u32,
            (true, false) => 0u32,
            // Ambiguous/no transition within the cell: treat as 0,
            // matching the "no transitions" default-to-zero behavior.
            _ => 0u32,
        };
        code = (code << 1) | bit;
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ntsc_line_duration() -> f64 {
        1.0 / 15_734.264
    }

    fn synth_manchester_line(bits: &[u8], width: usize, bit_period: f64, start: usize) -> Vec<f64> {
        let mut line = vec![0.0f64; width];
        for (i, &bit) in bits.iter().enumerate() {
            let cell_start = start as f64 + i as f64 * bit_period;
            let (first, second) = if bit == 1 { (0.0, 100.0) } else { (100.0, 0.0) };
            let a = (cell_start + bit_period * 0.25).round() as usize;
            let b = (cell_start + bit_period * 0.75).round() as usize;
            for idx in (cell_start as usize)..(cell_start + bit_period * 0.5) as usize {
                if idx < line.len() {
                    line[idx] = first;
                }
            }
            for idx in (cell_start + bit_period * 0.5) as usize..(cell_start + bit_period) as usize {
                if idx < line.len() {
                    line[idx] = second;
                }
            }
            let _ = (a, b);
        }
        line
    }

    #[test]
    fn no_transitions_decodes_to_zero() {
        let line = vec![0.0; 910];
        assert_eq!(decode_vbi_line(&line, 910, ntsc_line_duration()), 0);
    }

    #[test]
    fn decodes_a_known_pattern() {
        let width = 910;
        let samples_per_us = width as f64 / (ntsc_line_duration() * 1_000_000.0);
        let bit_period = 1.5 * samples_per_us;
        let bits = [1u8, 0, 1, 1, 0, 0, 1, 0, 1, 1, 1, 1, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 1, 0];
        let line = synth_manchester_line(&bits, width, bit_period, 70);
        let code = decode_vbi_line(&line, width, ntsc_line_duration());
        let expected = bits.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32);
        assert_eq!(code, expected);
    }
}
