//! Synthetic speech-like test audio
//!
//! A steady 440Hz tone stands in for voiced speech; silence gaps stand in
//! for breaths.

use breathcut::SampleBuffer;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub amplitude: f32,
    /// Silent spans `[start, end)` in seconds
    pub silence_gaps: Vec<(f64, f64)>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 1.0,
            sample_rate: 44100,
            channels: 1,
            amplitude: 0.3,
            silence_gaps: Vec::new(),
        }
    }
}

impl AudioConfig {
    pub fn with_gaps(mut self, gaps: &[(f64, f64)]) -> Self {
        self.silence_gaps = gaps.to_vec();
        self
    }

    pub fn total_frames(&self) -> usize {
        (self.duration_seconds * self.sample_rate as f64).round() as usize
    }

    /// Sample value at frame `i` (identical on every channel)
    pub fn sample(&self, i: usize) -> f32 {
        let t = i as f64 / self.sample_rate as f64;
        if self.silence_gaps.iter().any(|&(s, e)| t >= s && t < e) {
            0.0
        } else {
            self.amplitude * (2.0 * std::f64::consts::PI * 440.0 * t).sin() as f32
        }
    }
}

/// Planar buffer for `config`
pub fn tone_with_gaps(config: &AudioConfig) -> SampleBuffer {
    let frames = config.total_frames();
    let mono: Vec<f32> = (0..frames).map(|i| config.sample(i)).collect();
    let channels = vec![mono; config.channels as usize];
    SampleBuffer::new(channels, config.sample_rate).expect("valid generated buffer")
}

/// Write `config` as a 16-bit PCM WAV file with hound
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let bytes = generate_wav_bytes(config, 16, hound::SampleFormat::Int)?;
    std::fs::write(path, bytes)?;
    Ok(path.to_path_buf())
}

/// Encode `config` with hound at the given bit depth and sample format
pub fn generate_wav_bytes(
    config: &AudioConfig,
    bits_per_sample: u16,
    sample_format: hound::SampleFormat,
) -> anyhow::Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample,
        sample_format,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        let full_scale = ((1i64 << (bits_per_sample - 1)) - 1) as f64;

        for i in 0..config.total_frames() {
            let value = config.sample(i);
            for _ in 0..config.channels {
                match (sample_format, bits_per_sample) {
                    (hound::SampleFormat::Float, _) => writer.write_sample(value)?,
                    (hound::SampleFormat::Int, 8) => {
                        writer.write_sample((value as f64 * full_scale) as i8)?
                    }
                    (hound::SampleFormat::Int, 16) => {
                        writer.write_sample((value as f64 * full_scale) as i16)?
                    }
                    (hound::SampleFormat::Int, _) => {
                        writer.write_sample((value as f64 * full_scale) as i32)?
                    }
                }
            }
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
