//! Bicubic line resampling (spec.md §4.8 step 7) and the shared
//! 4-point cubic-convolution kernel also used by burst-phase scaling
//! (§4.8 step 6).

/// Catmull-Rom cubic convolution of four equally spaced samples
/// `p0..p3`, evaluated at fractional position `t` in `[0, 1)` between
/// `p1` and `p2`.
pub fn cubic_interpolate(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c = -0.5 * p0 + 0.5 * p2;
    let d = p1;
    ((a * t + b) * t + c) * t + d
}

/// Sample `input` at fractional index `pos` using the four nearest
/// samples, clamping at the ends (spec.md R4: a constant signal
/// resamples to the same constant).
pub fn bicubic_sample(input: &[f64], pos: f64) -> f64 {
    if input.is_empty() {
        return 0.0;
    }
    let i1 = pos.floor() as isize;
    let t = pos - i1 as f64;
    let at = |idx: isize| -> f64 {
        let clamped = idx.clamp(0, input.len() as isize - 1);
        input[clamped as usize]
    };
    cubic_interpolate(at(i1 - 1), at(i1), at(i1 + 1), at(i1 + 2), t)
}

/// Resample one line of `output_len` evenly spaced points between
/// `input[start..end]` (exclusive), with a phase shift expressed in
/// fractional input samples.
pub fn resample_line(input: &[f64], start: f64, end: f64, output_len: usize, phase_shift: f64) -> Vec<f64> {
    if output_len == 0 {
        return Vec::new();
    }
    let span = end - start;
    let step = span / output_len as f64;
    (0..output_len)
        .map(|i| bicubic_sample(input, start + phase_shift + step * i as f64))
        .collect()
}

/// Degrees of burst phase expressed as a fraction of one subcarrier
/// cycle, converted to input-sample units.
pub fn degrees_to_samples(degrees: f64, samples_per_cycle: f64) -> f64 {
    (degrees / 360.0) * samples_per_cycle
}
