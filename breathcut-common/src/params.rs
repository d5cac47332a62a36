//! Detection, removal and analysis parameters
//!
//! All parameter sets deserialize from TOML with per-field defaults, so a
//! partially filled `[detection]` table still yields a complete value.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Breath detection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionParameters {
    /// Sensitivity percent 0-100; higher lowers the silence threshold (default: 50)
    #[serde(default = "default_sensitivity")]
    pub sensitivity: u8,

    /// Minimum breath duration in milliseconds (default: 300ms)
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u32,
}

/// Breath removal parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemovalParameters {
    /// Silence inserted in place of each removed breath, in seconds (default: 0.2s)
    #[serde(default = "default_pause_seconds")]
    pub pause_seconds: f64,
}

/// Energy analysis settings
///
/// These were hard-wired constants in earlier tooling; the defaults keep
/// that behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// RMS window length in milliseconds (default: 20ms)
    #[serde(default = "default_window_ms")]
    pub window_ms: u32,

    /// Segments separated by less than this gap are merged (default: 100ms)
    #[serde(default = "default_merge_gap_ms")]
    pub merge_gap_ms: u32,
}

// Default value functions
fn default_sensitivity() -> u8 {
    50
}

fn default_min_duration_ms() -> u32 {
    300
}

fn default_pause_seconds() -> f64 {
    0.2
}

fn default_window_ms() -> u32 {
    20
}

fn default_merge_gap_ms() -> u32 {
    100
}

impl DetectionParameters {
    pub fn new(sensitivity: u8, min_duration_ms: u32) -> Self {
        Self {
            sensitivity,
            min_duration_ms,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sensitivity > 100 {
            return Err(Error::InvalidInput(format!(
                "sensitivity must be within 0-100, got {}",
                self.sensitivity
            )));
        }
        Ok(())
    }
}

impl RemovalParameters {
    pub fn new(pause_seconds: f64) -> Self {
        Self { pause_seconds }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.pause_seconds.is_finite() || self.pause_seconds < 0.0 {
            return Err(Error::InvalidInput(format!(
                "pause duration must be a finite number >= 0, got {}",
                self.pause_seconds
            )));
        }
        Ok(())
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<()> {
        if self.window_ms == 0 {
            return Err(Error::InvalidInput(
                "RMS window must be at least 1ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Merge gap in seconds
    pub fn merge_gap_seconds(&self) -> f64 {
        self.merge_gap_ms as f64 / 1000.0
    }

    /// RMS window length in samples at `sample_rate`, never less than one
    pub fn window_samples(&self, sample_rate: u32) -> usize {
        let samples = sample_rate as u64 * self.window_ms as u64 / 1000;
        samples.max(1) as usize
    }
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            min_duration_ms: default_min_duration_ms(),
        }
    }
}

impl Default for RemovalParameters {
    fn default() -> Self {
        Self {
            pause_seconds: default_pause_seconds(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            merge_gap_ms: default_merge_gap_ms(),
        }
    }
}
