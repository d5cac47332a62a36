//! Core audio data types
//!
//! Defines the sample buffer passed between every stage of the pipeline.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// SampleBuffer holds fully decoded audio in memory.
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - Planar: one `Vec<f32>` per channel, all of identical length
/// - At least one channel, sample rate > 0
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Per-channel PCM samples
    channels: Vec<Vec<f32>>,

    /// Sample rate in Hz
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create a buffer from planar channel data
    ///
    /// # Errors
    /// `InvalidParameter` if there are no channels, channel lengths differ,
    /// or the sample rate is zero.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::InvalidParameter(
                "sample buffer needs at least one channel".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(Error::InvalidParameter(
                "sample rate must be greater than zero".to_string(),
            ));
        }
        let frames = channels[0].len();
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != frames)
        {
            return Err(Error::InvalidParameter(format!(
                "channel {} has {} samples, expected {}",
                index,
                channel.len(),
                frames
            )));
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create a buffer of digital silence
    pub fn silent(channel_count: usize, frames: usize, sample_rate: u32) -> Result<Self> {
        Self::new(vec![vec![0.0; frames]; channel_count], sample_rate)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length of every channel in samples (frames)
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Get duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel, `None` if out of range
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Summary of this buffer for callers that never see samples
    pub fn info(&self) -> AudioInfo {
        AudioInfo {
            duration_seconds: self.duration_seconds(),
            sample_rate: self.sample_rate,
            channels: self.channel_count(),
            frames: self.frames(),
        }
    }
}

/// Format metadata reported after a load
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: usize,
    pub frames: usize,
}

/// Convert a time in seconds to a sample index: `floor(seconds * sample_rate)`
///
/// Products within 1e-6 of an integer snap to it, so `index / rate` produced
/// by the detector maps back to exactly `index`.
pub fn seconds_to_sample(seconds: f64, sample_rate: u32) -> usize {
    let position = seconds * sample_rate as f64;
    if position <= 0.0 || !position.is_finite() {
        return 0;
    }
    let nearest = position.round();
    if (position - nearest).abs() < 1e-6 {
        nearest as usize
    } else {
        position.floor() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_shape() {
        assert!(SampleBuffer::new(vec![], 44100).is_err());
        assert!(SampleBuffer::new(vec![vec![0.0; 4]], 0).is_err());
        assert!(SampleBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100).is_err());

        let buffer = SampleBuffer::new(vec![vec![0.0; 4], vec![0.5; 4]], 44100).unwrap();
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frames(), 4);
        assert_eq!(buffer.channel(1), Some(&[0.5f32; 4][..]));
        assert!(buffer.channel(2).is_none());
    }

    #[test]
    fn test_info() {
        let buffer = SampleBuffer::silent(2, 22050, 44100).unwrap();
        let info = buffer.info();
        assert_eq!(info.frames, 22050);
        assert_eq!(info.channels, 2);
        assert_eq!(info.sample_rate, 44100);
        assert!((info.duration_seconds - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_seconds_to_sample_floors() {
        assert_eq!(seconds_to_sample(0.3, 44100), 13230);
        assert_eq!(seconds_to_sample(0.00001, 44100), 0);
        assert_eq!(seconds_to_sample(1.5 / 44100.0, 44100), 1);
        assert_eq!(seconds_to_sample(-1.0, 44100), 0);
    }

    #[test]
    fn test_seconds_to_sample_round_trips_sample_indices() {
        for rate in [8000u32, 22050, 44100, 48000, 96000] {
            for index in (0..rate as usize * 5).step_by(7) {
                let seconds = index as f64 / rate as f64;
                assert_eq!(seconds_to_sample(seconds, rate), index, "rate {}", rate);
            }
        }
    }
}
