//! HSYNC end-position refinement and width validation (spec.md §4.8
//! step 4). The 9-tap symmetric low-pass used to smooth the sync edge
//! before crossing interpolation is the same filter ld-decode's NTSC
//! prototype decoder applies ahead of its sync-end search.

use crate::video::agc::IreScale;

/// 9-tap symmetric FIR low-pass used to smooth the sync edge before
/// crossing interpolation.
pub const HSYNC_FIR: [f64; 9] = [
    1.447786467971050e-02,
    4.395811440315845e-02,
    1.202636955256379e-01,
    2.024216184054497e-01,
    2.377574139720867e-01,
    2.024216184054497e-01,
    1.202636955256379e-01,
    4.395811440315847e-02,
    1.447786467971050e-02,
];

const CROSSING_IRE: f64 = -20.0;

fn filtered_sample(samples: &[i16], center: isize) -> f64 {
    let half = (HSYNC_FIR.len() / 2) as isize;
    let mut acc = 0.0;
    for (k, &tap) in HSYNC_FIR.iter().enumerate() {
        let idx = (center - half + k as isize).clamp(0, samples.len() as isize - 1) as usize;
        acc += tap * samples[idx] as f64;
    }
    acc
}

/// Refine a candidate HSYNC's trailing edge: walk forward from
/// `hsync_pos`, FIR-smoothing the signal, until it rises back through
/// `-20` IRE, then linearly interpolate the fractional crossing point.
pub fn refine_sync_end(samples: &[i16], ire: &IreScale, hsync_pos: usize, search_len: usize) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let end = (hsync_pos + search_len).min(samples.len().saturating_sub(1));
    let threshold = ire.ire_to_sample(CROSSING_IRE);
    let mut prev = filtered_sample(samples, hsync_pos as isize);
    for pos in hsync_pos + 1..end {
        let cur = filtered_sample(samples, pos as isize);
        if prev < threshold && cur >= threshold {
            let frac = (threshold - prev) / (cur - prev);
            return Some((pos - 1) as f64 + frac);
        }
        prev = cur;
    }
    None
}

/// Validate a measured sync width (in input samples) against the
/// expected 15.75..17.25 colorburst-cycle range (spec.md §4.8 step 4).
pub fn width_in_range(width_samples: f64, samples_per_burst_cycle: f64) -> bool {
    if samples_per_burst_cycle <= 0.0 {
        return false;
    }
    let width_cycles = width_samples / samples_per_burst_cycle;
    (15.75..=17.25).contains(&width_cycles)
}
