//! VSYNC/HSYNC detection (spec.md §4.8 steps 2-3).
//!
//! Both stages share one primitive: a windowed run-length detector
//! that finds contiguous stretches of samples sitting in the sync-tip
//! IRE band. A short run is an ordinary HSYNC pulse; a long run (or a
//! cluster of them) is part of the vertical-sync serration/
//! equalization sequence.

use crate::video::agc::IreScale;

/// Samples are "in sync" when their IRE falls in this band (spec.md
/// §4.8 step 2: "-45..-35 IRE band").
const SYNC_BAND_LOW: f64 = -45.0;
const SYNC_BAND_HIGH: f64 = -35.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRun {
    pub start: usize,
    pub len: usize,
}

/// Scan `samples` for runs of at least `min_len` consecutive samples
/// whose IRE falls within the sync band.
pub fn find_sync_runs(samples: &[i16], ire: &IreScale, min_len: usize) -> Vec<SyncRun> {
    let mut runs = Vec::new();
    let mut run_start: Option<usize> = None;
    for (i, &s) in samples.iter().enumerate() {
        let level = ire.sample_to_ire(s);
        let in_band = (SYNC_BAND_LOW..=SYNC_BAND_HIGH).contains(&level) || level < SYNC_BAND_LOW;
        match (in_band, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                let len = i - start;
                if len >= min_len {
                    runs.push(SyncRun { start, len });
                }
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        let len = samples.len() - start;
        if len >= min_len {
            runs.push(SyncRun { start, len });
        }
    }
    runs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolarity {
    Odd,
    Even,
}

#[derive(Debug, Clone, Copy)]
pub struct VsyncEvent {
    pub position: usize,
    pub polarity: FieldPolarity,
}

/// Locates the vertical-sync serration sequence: a cluster of broad
/// sync-band runs (much longer than an ordinary HSYNC pulse) spaced at
/// roughly half-line intervals. Polarity is decided by comparing the
/// sync-run count in the half field before the cluster against the
/// half field after it (spec.md §4.8 step 2).
pub fn find_vsync(
    samples: &[i16],
    ire: &IreScale,
    samples_per_line: f64,
) -> Option<VsyncEvent> {
    if samples.is_empty() || samples_per_line <= 0.0 {
        return None;
    }
    // An ordinary HSYNC is ~4.7us wide (~7% of the line); broad
    // vertical-serration pulses are half a line or more.
    let broad_min_len = (samples_per_line * 0.3).round().max(1.0) as usize;
    let runs = find_sync_runs(samples, ire, broad_min_len);
    if runs.len() < 6 {
        return None;
    }

    // Six consecutive broad pulses spaced near half a line apart is
    // the vertical-sync/equalization signature.
    let half_line = samples_per_line / 2.0;
    let mut best: Option<usize> = None;
    for w in runs.windows(6) {
        let spacings_ok = w.windows(2).all(|pair| {
            let gap = (pair[1].start as f64) - (pair[0].start as f64);
            (gap - half_line).abs() < half_line * 0.5
        });
        if spacings_ok {
            best = Some(w[0].start);
            break;
        }
    }
    let position = best.unwrap_or(runs[0].start);

    let window = (samples_per_line * 3.0).round() as usize;
    let before_start = position.saturating_sub(window);
    let before = find_sync_runs(&samples[before_start..position], ire, broad_min_len / 2).len();
    let after_end = (position + window).min(samples.len());
    let after = find_sync_runs(&samples[position..after_end], ire, broad_min_len / 2).len();

    let polarity = if before > after {
        FieldPolarity::Even
    } else {
        FieldPolarity::Odd
    };

    Some(VsyncEvent { position, polarity })
}

#[derive(Debug, Clone, Copy)]
pub struct HsyncLine {
    pub position: usize,
    pub bad: bool,
}

/// Starting at `start_offset` samples past the VSYNC event, repeatedly
/// locate the next HSYNC pulse at roughly one line-period spacing
/// until `line_count` lines have been found (spec.md §4.8 step 3).
/// Missing pulses are flagged `bad` rather than stalling the field.
pub fn find_hsyncs(
    samples: &[i16],
    ire: &IreScale,
    start_offset: usize,
    samples_per_line: f64,
    line_count: usize,
) -> Vec<HsyncLine> {
    let min_len = (samples_per_line * 0.04).round().max(1.0) as usize;
    let search_slack = (samples_per_line * 0.25).round() as usize;

    let mut lines = Vec::with_capacity(line_count);
    let mut expected = start_offset as f64;

    for _ in 0..line_count {
        let window_start = (expected as usize).saturating_sub(search_slack);
        let window_end = ((expected as usize) + search_slack).min(samples.len());
        if window_start >= window_end {
            lines.push(HsyncLine {
                position: expected.round() as usize,
                bad: true,
            });
            expected += samples_per_line;
            continue;
        }

        let runs = find_sync_runs(&samples[window_start..window_end], ire, min_len);
        match runs.into_iter().min_by_key(|r| {
            let abs_pos = window_start + r.start;
            (abs_pos as isize - expected as isize).unsigned_abs()
        }) {
            Some(run) => {
                let position = window_start + run.start;
                lines.push(HsyncLine {
                    position,
                    bad: false,
                });
                expected = position as f64 + samples_per_line;
            }
            None => {
                lines.push(HsyncLine {
                    position: expected.round() as usize,
                    bad: true,
                });
                expected += samples_per_line;
            }
        }
    }
    lines
}

/// Replace bad HSYNC positions with the linear interpolation of the
/// nearest earlier and later good lines (spec.md §4.8 step 5).
pub fn interpolate_damaged(lines: &mut [HsyncLine]) {
    let n = lines.len();
    for i in 0..n {
        if !lines[i].bad {
            continue;
        }
        let earlier = (0..i).rev().find(|&j| !lines[j].bad);
        let later = (i + 1..n).find(|&j| !lines[j].bad);
        if let (Some(a), Some(b)) = (earlier, later) {
            let frac = (i - a) as f64 / (b - a) as f64;
            let pos = lines[a].position as f64
                + frac * (lines[b].position as f64 - lines[a].position as f64);
            lines[i].position = pos.round() as usize;
        } else if let Some(a) = earlier {
            lines[i].position = lines[a].position;
        } else if let Some(b) = later {
            lines[i].position = lines[b].position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync_pulse_line(line_len: usize, sync_len: usize) -> Vec<i16> {
        let ire = IreScale::fixed();
        let mut line = vec![ire.ire_to_sample(0.0) as i16; line_len];
        for s in line.iter_mut().take(sync_len) {
            *s = ire.ire_to_sample(-40.0) as i16;
        }
        line
    }

    #[test]
    fn finds_ordinary_hsync_runs() {
        let ire = IreScale::fixed();
        let line_len = 910;
        let sync_len = 40;
        let mut samples = Vec::new();
        for _ in 0..10 {
            samples.extend(sync_pulse_line(line_len, sync_len));
        }
        let runs = find_sync_runs(&samples, &ire, 20);
        assert_eq!(runs.len(), 10);
        for run in &runs {
            assert!(run.len >= sync_len - 2);
        }
    }

    #[test]
    fn hsync_finder_locates_all_lines_in_clean_signal() {
        let ire = IreScale::fixed();
        let line_len = 910.0;
        let mut samples = Vec::new();
        for _ in 0..20 {
            samples.extend(sync_pulse_line(line_len as usize, 40));
        }
        let lines = find_hsyncs(&samples, &ire, 0, line_len, 15);
        assert_eq!(lines.len(), 15);
        assert!(lines.iter().all(|l| !l.bad));
    }

    #[test]
    fn missing_pulse_is_flagged_and_interpolated() {
        let mut lines = vec![
            HsyncLine { position: 0, bad: false },
            HsyncLine { position: 0, bad: true },
            HsyncLine { position: 200, bad: false },
        ];
        interpolate_damaged(&mut lines);
        assert_eq!(lines[1].position, 100);
    }

    #[test]
    fn empty_input_returns_no_vsync() {
        let ire = IreScale::fixed();
        assert!(find_vsync(&[], &ire, 910.0).is_none());
    }
}
