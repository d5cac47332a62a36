//! Breath detection over an energy profile
//!
//! Windows whose RMS falls below `avg_rms * (1 - sensitivity / 100)` are
//! silent. Runs of silent windows at least `min_duration_ms` long become
//! breath segments, and segments separated by less than the merge gap are
//! joined.

use crate::audio::types::seconds_to_sample;
use crate::error::Result;
use crate::progress::{ProgressSink, StagedProgress};
use crate::services::energy_analyzer::EnergyProfile;
use breathcut_common::{AnalysisSettings, DetectionParameters};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Breath region `[start, end)` in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreathSegment {
    /// Start time of the breath in seconds
    pub start_seconds: f64,
    /// End time (exclusive) of the breath in seconds
    pub end_seconds: f64,
}

impl BreathSegment {
    /// Create new breath segment
    ///
    /// # Arguments
    /// * `start_seconds` - Start time in seconds
    /// * `end_seconds` - End time in seconds
    pub fn new(start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds,
            end_seconds,
        }
    }

    /// Duration of the segment in seconds
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Breath detector
#[derive(Debug, Clone)]
pub struct BreathDetector {
    /// Sensitivity percent 0-100
    sensitivity: u8,

    /// Minimum breath duration in milliseconds
    min_duration_ms: u32,

    /// Maximum gap between segments that still get merged, in seconds
    merge_gap_seconds: f64,
}

impl BreathDetector {
    /// Create new breath detector with defaults (50%, 300ms, 100ms merge gap)
    pub fn new() -> Self {
        Self::from_parameters(
            &DetectionParameters::default(),
            &AnalysisSettings::default(),
        )
    }

    /// Build a detector from already validated parameter sets
    pub fn from_parameters(params: &DetectionParameters, settings: &AnalysisSettings) -> Self {
        Self {
            sensitivity: params.sensitivity.min(100),
            min_duration_ms: params.min_duration_ms,
            merge_gap_seconds: settings.merge_gap_seconds(),
        }
    }

    /// Set sensitivity percent
    pub fn with_sensitivity(mut self, sensitivity: u8) -> Result<Self> {
        DetectionParameters::new(sensitivity, self.min_duration_ms).validate()?;
        self.sensitivity = sensitivity;
        Ok(self)
    }

    /// Set minimum breath duration
    pub fn with_min_duration_ms(mut self, min_duration_ms: u32) -> Self {
        self.min_duration_ms = min_duration_ms;
        self
    }

    /// Set merge gap
    pub fn with_merge_gap_ms(mut self, merge_gap_ms: u32) -> Self {
        self.merge_gap_seconds = merge_gap_ms as f64 / 1000.0;
        self
    }

    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    pub fn min_duration_ms(&self) -> u32 {
        self.min_duration_ms
    }

    /// Absolute RMS threshold for a profile with the given mean energy
    pub fn threshold(&self, avg_rms: f32) -> f32 {
        avg_rms * (1.0 - self.sensitivity as f32 / 100.0)
    }

    /// Detect breath segments in an energy profile
    ///
    /// Returns segments in start order, non-overlapping after merging.
    pub fn detect(&self, profile: &EnergyProfile<'_>) -> Vec<BreathSegment> {
        self.detect_with_progress(profile, &mut |_: f32| {})
    }

    /// [`BreathDetector::detect`] reporting 40-90 progress across windows
    pub fn detect_with_progress<P: ProgressSink + ?Sized>(
        &self,
        profile: &EnergyProfile<'_>,
        progress: &mut P,
    ) -> Vec<BreathSegment> {
        let threshold = self.threshold(profile.avg_rms());
        let sample_rate = profile.sample_rate();

        debug!(
            avg_rms = profile.avg_rms(),
            threshold,
            sensitivity = self.sensitivity,
            "Detecting breaths"
        );

        let min_samples = self.min_duration_samples(sample_rate);
        let mut runs = Vec::new();
        let mut in_silence = false;
        let mut silence_start = 0usize; // samples

        let stage = StagedProgress::new(40.0, 90.0, profile.window_count());
        for (index, window) in profile.windows().enumerate() {
            if window.rms < threshold {
                if !in_silence {
                    in_silence = true;
                    silence_start = window.start_sample;
                }
            } else if in_silence {
                push_run(&mut runs, silence_start, window.start_sample, min_samples);
                in_silence = false;
            }
            stage.step(progress, index + 1);
        }

        // Silence running to the end of the buffer
        if in_silence {
            push_run(&mut runs, silence_start, profile.len(), min_samples);
        }

        let candidates = runs.len();
        let merge_gap = seconds_to_sample(self.merge_gap_seconds, sample_rate);
        let merged: Vec<BreathSegment> = merge_runs(runs, merge_gap)
            .into_iter()
            .map(|(start, end)| {
                BreathSegment::new(
                    start as f64 / sample_rate as f64,
                    end as f64 / sample_rate as f64,
                )
            })
            .collect();

        debug!(candidates, merged = merged.len(), "Breath detection complete");
        merged
    }

    /// Shortest silent run, in samples, that counts as a breath
    ///
    /// `ceil(min_ms * rate / 1000)`, equivalent to `run_ms >= min_ms`.
    fn min_duration_samples(&self, sample_rate: u32) -> usize {
        let product = self.min_duration_ms as u64 * sample_rate as u64;
        product.div_ceil(1000) as usize
    }
}

/// Keep the silent run `[start, end)` if it meets the minimum length
fn push_run(runs: &mut Vec<(usize, usize)>, start: usize, end: usize, min_samples: usize) {
    if end - start >= min_samples {
        runs.push((start, end));
    }
}

/// Sample-exact counterpart of [`merge_close_segments`]
fn merge_runs(runs: Vec<(usize, usize)>, max_gap: usize) -> Vec<(usize, usize)> {
    let mut iter = runs.into_iter();
    let Some(mut current) = iter.next() else {
        return Vec::new();
    };

    let mut merged = Vec::new();
    for next in iter {
        if next.0 - current.1 < max_gap {
            current.1 = next.1;
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);
    merged
}

impl Default for BreathDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Float slack when comparing a gap against the merge limit
pub const GAP_TOLERANCE_SECONDS: f64 = 1e-9;

/// Merge start-ordered segments whose gap is below `max_gap_seconds`
///
/// Single left-to-right pass; each extended segment is compared against the
/// next one, so merges cascade. Gaps within [`GAP_TOLERANCE_SECONDS`] of the
/// limit count as equal to it and stay apart.
pub fn merge_close_segments(segments: Vec<BreathSegment>, max_gap_seconds: f64) -> Vec<BreathSegment> {
    let mut iter = segments.into_iter();
    let Some(mut current) = iter.next() else {
        return Vec::new();
    };

    let mut merged = Vec::new();
    for next in iter {
        if next.start_seconds - current.end_seconds < max_gap_seconds - GAP_TOLERANCE_SECONDS {
            current.end_seconds = next.end_seconds;
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);
    merged
}
