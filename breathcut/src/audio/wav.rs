//! PCM WAV codec
//!
//! Decodes RIFF/WAVE containers (read with hound) into planar f32 buffers
//! and encodes buffers back into a canonical 44-byte-header, 16-bit PCM file.
//!
//! Integer samples use an asymmetric scale: negative values map against
//! 2^(n-1), non-negative values against 2^(n-1) - 1. Encoding truncates
//! toward zero without dither, which keeps output bit-exact with files
//! produced by earlier tooling.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use crate::progress::{ignore_progress, ProgressSink, StagedProgress};
use std::io::Cursor;
use tracing::{debug, warn};

/// Size of the canonical header written by [`encode`]
pub const WAV_HEADER_LEN: usize = 44;

const FORMAT_PCM: u16 = 0x0001;

/// Decode a WAV byte buffer into a sample buffer
///
/// A `data` chunk that declares more bytes than the file holds is read up to
/// the last whole frame present.
///
/// # Errors
/// * `Format` - not RIFF/WAVE, truncated header or missing chunks, zero channels or rate
/// * `UnsupportedFormat` - compressed encodings, unhandled bit depths
pub fn decode(bytes: &[u8]) -> Result<SampleBuffer> {
    decode_with_progress(bytes, &mut ignore_progress)
}

/// [`decode`] reporting 0-100 progress across frames
pub fn decode_with_progress<P: ProgressSink + ?Sized>(
    bytes: &[u8],
    progress: &mut P,
) -> Result<SampleBuffer> {
    progress.report(0.0);

    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(Error::Format("sample rate is zero".to_string()));
    }

    let declared_frames = reader.duration() as usize;
    debug!(
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits_per_sample = spec.bits_per_sample,
        declared_frames,
        "Decoding WAV data"
    );

    // The header's frame count is untrusted; the file can't hold more frames than bytes
    let capacity = declared_frames.min(bytes.len());
    let mut channels: Vec<Vec<f32>> = (0..spec.channels)
        .map(|_| Vec::with_capacity(capacity))
        .collect();
    let stage = StagedProgress::new(0.0, 100.0, declared_frames);

    match spec.sample_format {
        hound::SampleFormat::Int => {
            let bits = u32::from(spec.bits_per_sample);
            let samples = reader
                .samples::<i32>()
                .map(|s| s.map(|value| scale_int(value, bits)));
            deinterleave(samples, &mut channels, &stage, progress)?;
        }
        hound::SampleFormat::Float => {
            deinterleave(reader.samples::<f32>(), &mut channels, &stage, progress)?;
        }
    }

    let frames = channels.first().map_or(0, Vec::len);
    if frames < declared_frames {
        warn!(
            declared_frames,
            frames, "WAV data chunk larger than file, truncating"
        );
    }

    progress.report(100.0);
    SampleBuffer::new(channels, spec.sample_rate)
}

/// Split interleaved samples into `channels`, stopping at the first short read
fn deinterleave<I, P>(
    samples: I,
    channels: &mut [Vec<f32>],
    stage: &StagedProgress,
    progress: &mut P,
) -> Result<()>
where
    I: Iterator<Item = hound::Result<f32>>,
    P: ProgressSink + ?Sized,
{
    let channel_count = channels.len();
    let mut frame = Vec::with_capacity(channel_count);
    let mut frames = 0usize;

    for sample in samples {
        match sample {
            Ok(value) => frame.push(value),
            // Data ends before the declared length
            Err(hound::Error::IoError(_)) => break,
            Err(e) => return Err(e.into()),
        }

        if frame.len() == channel_count {
            for (channel, value) in channels.iter_mut().zip(frame.drain(..)) {
                channel.push(value);
            }
            frames += 1;
            stage.step(progress, frames);
        }
    }

    if !frame.is_empty() {
        warn!(
            trailing_samples = frame.len(),
            "WAV data ends with a partial frame, ignoring it"
        );
    }
    Ok(())
}

/// Encode a buffer as a canonical 16-bit PCM WAV file
///
/// Output length is exactly `44 + frames * channels * 2` bytes. Header
/// fields are written modulo their width, so encoding never fails.
pub fn encode(buffer: &SampleBuffer) -> Vec<u8> {
    encode_with_progress(buffer, &mut ignore_progress)
}

/// [`encode`] reporting 0-100 progress across frames
pub fn encode_with_progress<P: ProgressSink + ?Sized>(
    buffer: &SampleBuffer,
    progress: &mut P,
) -> Vec<u8> {
    progress.report(0.0);

    let channel_count = buffer.channel_count();
    let frames = buffer.frames();
    let data_len = frames * channel_count * 2;
    let sample_rate = buffer.sample_rate();
    let block_align = (channel_count as u16).wrapping_mul(2);

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(data_len as u32).wrapping_add(36).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&(channel_count as u16).to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&sample_rate.wrapping_mul(u32::from(block_align)).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());

    let channels = buffer.channels();
    let stage = StagedProgress::new(0.0, 100.0, frames);
    for frame in 0..frames {
        for channel in channels {
            out.extend_from_slice(&f32_to_i16(channel[frame]).to_le_bytes());
        }
        stage.step(progress, frame + 1);
    }

    progress.report(100.0);
    out
}

/// Quantize one sample to int16 (clamp, asymmetric scale, truncate)
pub fn f32_to_i16(sample: f32) -> i16 {
    let sample = sample.clamp(-1.0, 1.0);
    if sample < 0.0 {
        (sample * 32768.0) as i16
    } else {
        (sample * 32767.0) as i16
    }
}

/// Mirror of the encoder's asymmetric scale for `bits`-wide integers
fn scale_int(value: i32, bits: u32) -> f32 {
    let negative_full_scale = (1i64 << (bits.clamp(1, 32) - 1)) as f64;
    if value < 0 {
        (value as f64 / negative_full_scale) as f32
    } else {
        (value as f64 / (negative_full_scale - 1.0).max(1.0)) as f32
    }
}
