//! Short-time RMS energy analysis
//!
//! Splits one channel into fixed, non-overlapping windows (20ms by default)
//! and yields the RMS of each. The last window may be short and is averaged
//! over its own sample count.

use crate::progress::{ProgressSink, StagedProgress};
use breathcut_common::AnalysisSettings;

/// One analysis window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyWindow {
    /// Index of the window's first sample
    pub start_sample: usize,
    /// Root-mean-square amplitude of the window
    pub rms: f32,
}

/// Energy profile of one channel
///
/// Window values are computed lazily by [`EnergyProfile::windows`]; the
/// iterator can be restarted any number of times. Only the buffer-wide mean
/// RMS is computed up front.
#[derive(Debug, Clone)]
pub struct EnergyProfile<'a> {
    samples: &'a [f32],
    sample_rate: u32,
    window_size: usize,
    avg_rms: f32,
}

impl<'a> EnergyProfile<'a> {
    /// Compute the profile of `samples` with the given window settings
    pub fn compute(samples: &'a [f32], sample_rate: u32, settings: &AnalysisSettings) -> Self {
        Self::compute_with_progress(samples, sample_rate, settings, &mut |_: f32| {})
    }

    /// [`EnergyProfile::compute`] reporting `progress_range` across the mean-RMS pass
    pub fn compute_with_progress<P: ProgressSink + ?Sized>(
        samples: &'a [f32],
        sample_rate: u32,
        settings: &AnalysisSettings,
        progress: &mut P,
    ) -> Self {
        let mut profile = Self {
            samples,
            sample_rate,
            window_size: settings.window_samples(sample_rate),
            avg_rms: 0.0,
        };

        let total = profile.window_count();
        let stage = StagedProgress::new(10.0, 40.0, total);
        let mut sum = 0.0f64;
        for (index, window) in profile.windows().enumerate() {
            sum += window.rms as f64;
            stage.step(progress, index + 1);
        }
        if total > 0 {
            profile.avg_rms = (sum / total as f64) as f32;
        }

        tracing::debug!(
            windows = total,
            window_size = profile.window_size,
            avg_rms = profile.avg_rms,
            "Energy profile computed"
        );

        profile
    }

    /// Iterate window RMS values in chronological order
    pub fn windows(&self) -> EnergyWindows<'a> {
        EnergyWindows {
            chunks: self.samples.chunks(self.window_size),
            next_start: 0,
        }
    }

    /// Mean of all window RMS values (0.0 for an empty channel)
    pub fn avg_rms(&self) -> f32 {
        self.avg_rms
    }

    /// Window length in samples
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of windows, counting a trailing partial window
    pub fn window_count(&self) -> usize {
        self.samples.len().div_ceil(self.window_size)
    }

    /// Length of the analyzed channel in samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Iterator over the windows of an [`EnergyProfile`]
#[derive(Debug, Clone)]
pub struct EnergyWindows<'a> {
    chunks: std::slice::Chunks<'a, f32>,
    next_start: usize,
}

impl Iterator for EnergyWindows<'_> {
    type Item = EnergyWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        let window = EnergyWindow {
            start_sample: self.next_start,
            rms: calculate_rms(chunk),
        };
        self.next_start += chunk.len();
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for EnergyWindows<'_> {}

/// Calculate RMS (Root Mean Square) of samples
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}
