//! Top-level video TBC pipeline (spec.md §4.8): wires auto-ranging,
//! VSYNC/HSYNC detection, damaged-line interpolation, burst-phase
//! lock, bicubic resampling, VBI demodulation, dropout concealment,
//! frame-locked audio interpolation, and frame assembly into one
//! streaming `feed` call per processing buffer.

use crate::config::VideoConfig;
use crate::video::agc::{AutoRanger, IreScale};
use crate::video::audio_interp::{AudioInterpolator, StereoSample};
use crate::video::burst;
use crate::video::dropout::{self, DropoutRun};
use crate::video::field::{self, Field, Frame};
use crate::video::refine;
use crate::video::resample;
use crate::video::sync::{self, FieldPolarity, HsyncLine};
use crate::video::vbi_demod;

#[derive(Debug, Default, Clone)]
pub struct VideoOutput {
    pub fields: Vec<Field>,
    pub frames: Vec<Frame>,
    /// One interpolated-audio vector per field, line-aligned with
    /// `fields[i].lines` (spec.md §4.8 step 10).
    pub audio: Vec<Vec<StereoSample>>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Statistics {
    pub fields_decoded: u64,
    pub vsync_not_found: u64,
    pub bad_hsync_lines: u64,
    pub dropouts: u64,
    pub burst_lock_failures: u64,
}

pub struct Pipeline {
    config: VideoConfig,
    agc: AutoRanger,
    audio_interp: AudioInterpolator,
    stats: Statistics,
    pending_odd: Option<Field>,
    pending_even: Option<Field>,
    frame_counter: f64,
}

/// First HSYNC is this many samples past VSYNC for an odd field, this
/// many for even (spec.md §4.8 step 3).
const ODD_FIELD_OFFSET: f64 = 750.0;
const EVEN_FIELD_OFFSET: f64 = 871.0;
const BURST_LOCK_LINES: usize = 64;
const BURST_REFINEMENT_PASSES: usize = 4;

impl Pipeline {
    pub fn new(config: &VideoConfig, audio_sample_rate_hz: f64) -> Self {
        Self {
            config: config.clone(),
            agc: AutoRanger::for_config(config),
            audio_interp: AudioInterpolator::new(audio_sample_rate_hz),
            stats: Statistics::default(),
            pending_odd: None,
            pending_even: None,
            frame_counter: 0.0,
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    /// Feed one processing buffer (spec.md §4.8: "per processing
    /// buffer of ~1100 lines of samples") of RF samples, plus the
    /// optional interleaved-stereo audio captured over the same span,
    /// and get back every field (and any frames it completes).
    pub fn feed(&mut self, samples: &[i16], audio: Option<&[StereoSample]>) -> VideoOutput {
        let mut output = VideoOutput::default();

        let ire = if self.config.auto_range {
            self.agc.process(samples)
        } else {
            IreScale::fixed()
        };

        let samples_per_line = self.config.samples_per_line();
        let Some(vsync) = sync::find_vsync(samples, &ire, samples_per_line) else {
            self.stats.vsync_not_found += 1;
            return output;
        };

        let start_offset = match vsync.polarity {
            FieldPolarity::Odd => ODD_FIELD_OFFSET,
            FieldPolarity::Even => EVEN_FIELD_OFFSET,
        };
        let active_lines = self.config.standard.lines_per_field().saturating_sub(9);
        let mut hsync_lines = sync::find_hsyncs(
            samples,
            &ire,
            vsync.position + start_offset as usize,
            samples_per_line,
            active_lines,
        );
        self.stats.bad_hsync_lines += hsync_lines.iter().filter(|l| l.bad).count() as u64;
        sync::interpolate_damaged(&mut hsync_lines);

        self.refine_sync_ends(samples, &ire, &mut hsync_lines, samples_per_line);
        self.lock_burst_phase(samples, &ire, &mut hsync_lines, samples_per_line);

        let floats: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        let output_width = self.config.standard.output_line_width();
        let samples_per_cycle = self.config.samples_per_burst_cycle();
        let phase_shift = resample::degrees_to_samples(
            self.config.standard.resample_phase_shift_degrees(),
            samples_per_cycle,
        );

        let mut lines_ire: Vec<Vec<f64>> = Vec::with_capacity(hsync_lines.len());
        for line in &hsync_lines {
            let start = line.position as f64;
            let end = start + samples_per_line;
            let resampled = resample::resample_line(&floats, start, end, output_width, phase_shift);
            lines_ire.push(resampled.iter().map(|&v| ire.sample_to_ire_f64(v)).collect());
        }

        let dropouts: Vec<DropoutRun> = dropout::detect_and_conceal(&mut lines_ire);
        self.stats.dropouts += dropouts.len() as u64;

        let lines_i16: Vec<Vec<i16>> = lines_ire
            .iter()
            .map(|line| {
                line.iter()
                    .map(|&v| {
                        ire.ire_to_sample(v)
                            .round()
                            .clamp(i16::MIN as f64, i16::MAX as f64) as i16
                    })
                    .collect()
            })
            .collect();

        let line_duration = 1.0 / self.config.standard.line_frequency_hz();
        let vbi_codes: Vec<u32> = self
            .config
            .standard
            .vbi_lines()
            .iter()
            .map(|&idx| {
                lines_ire
                    .get(idx)
                    .map(|line| vbi_demod::decode_vbi_line(line, output_width, line_duration))
                    .unwrap_or(0)
            })
            .collect();

        let field = Field {
            lines: lines_i16,
            polarity: vsync.polarity,
            vbi_codes: [vbi_codes[0], vbi_codes[1], vbi_codes[2]],
            dropouts,
        };
        self.stats.fields_decoded += 1;

        let frame_audio = self.interpolate_audio(audio, active_lines);
        output.audio.push(frame_audio);
        output.fields.push(field.clone());

        match vsync.polarity {
            FieldPolarity::Odd => self.pending_odd = Some(field),
            FieldPolarity::Even => self.pending_even = Some(field),
        }
        if let (Some(odd), Some(even)) = (&self.pending_odd, &self.pending_even) {
            let rows = self.config.standard.output_rows_per_frame();
            output
                .frames
                .push(field::assemble_frame(odd, even, rows, output_width));
            self.pending_odd = None;
            self.pending_even = None;
            self.frame_counter += 1.0;
        }

        output
    }

    fn refine_sync_ends(
        &self,
        samples: &[i16],
        ire: &IreScale,
        hsync_lines: &mut [HsyncLine],
        samples_per_line: f64,
    ) {
        let search_len = (samples_per_line * 0.1).round().max(1.0) as usize;
        let samples_per_cycle = self.config.samples_per_burst_cycle();
        for line in hsync_lines.iter_mut() {
            if let Some(end) = refine::refine_sync_end(samples, ire, line.position, search_len) {
                let width = end - line.position as f64;
                if !refine::width_in_range(width, samples_per_cycle) {
                    line.bad = true;
                }
            }
        }
    }

    fn lock_burst_phase(
        &mut self,
        samples: &[i16],
        ire: &IreScale,
        hsync_lines: &mut [HsyncLine],
        samples_per_line: f64,
    ) {
        let samples_per_cycle = self.config.samples_per_burst_cycle();
        let scaled_spc = samples_per_cycle * (2275.0 / samples_per_line);
        let lock_count = hsync_lines.len().min(BURST_LOCK_LINES);
        if lock_count == 0 {
            return;
        }

        let mut positions: Vec<f64> = hsync_lines[..lock_count].iter().map(|l| l.position as f64).collect();
        let mut measurements = Vec::new();
        for _ in 0..BURST_REFINEMENT_PASSES {
            measurements = positions
                .iter()
                .map(|&pos| {
                    let scaled = burst::scale_line_for_burst(samples, pos, samples_per_line);
                    burst::measure_burst(&scaled, scaled_spc)
                })
                .collect();
            burst::refine_hsync_positions(&mut positions, &measurements, samples_per_cycle);
        }
        for (line, pos) in hsync_lines.iter_mut().zip(positions) {
            line.position = pos.round().max(0.0) as usize;
        }

        // Nominal burst amplitude is ~40 IRE peak; a field whose mean
        // burst amplitude falls short of the configured fraction of
        // that is reported as a lock failure rather than silently used.
        let nominal_ire = 40.0 * ire.scale;
        let mean_amplitude = measurements.iter().map(|m| m.amplitude).sum::<f64>() / measurements.len().max(1) as f64;
        if mean_amplitude < self.config.burst_lock_threshold * nominal_ire {
            self.stats.burst_lock_failures += 1;
        }
    }

    fn interpolate_audio(
        &self,
        audio: Option<&[StereoSample]>,
        active_lines: usize,
    ) -> Vec<StereoSample> {
        let Some(audio) = audio else {
            return Vec::new();
        };
        let lines_per_frame = self.config.standard.lines_per_field() * 2;
        let fps = self.config.standard.fields_per_second() / 2.0;
        (0..active_lines)
            .map(|line| {
                self.audio_interp
                    .sample_for_line(audio, self.frame_counter, line, lines_per_frame, fps)
            })
            .collect()
    }
}
