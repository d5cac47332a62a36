//! Buffer reconstruction with breaths replaced by fixed pauses
//!
//! Every channel is cut at the same sample positions. Each segment
//! `[start, end)` is dropped and `floor(pause_seconds * sample_rate)` zero
//! samples are written in its place.

use crate::audio::types::{seconds_to_sample, SampleBuffer};
use crate::error::{Error, Result};
use crate::progress::ProgressSink;
use crate::services::breath_detector::BreathSegment;
use tracing::debug;

/// A segment resolved to sample positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpan {
    pub start: usize,
    pub end: usize,
}

impl SampleSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Number of zero samples inserted per removed segment
pub fn pause_samples(pause_seconds: f64, sample_rate: u32) -> usize {
    seconds_to_sample(pause_seconds, sample_rate)
}

/// Resolve segments to sample spans, validating order and bounds
///
/// Positions past the end of the buffer are clamped to it.
///
/// # Errors
/// * `EmptySegments` - no segments given
/// * `InvalidParameter` - non-finite or negative times, `end <= start`,
///   or segments out of order / overlapping
pub fn resolve_spans(
    segments: &[BreathSegment],
    sample_rate: u32,
    frames: usize,
) -> Result<Vec<SampleSpan>> {
    if segments.is_empty() {
        return Err(Error::EmptySegments);
    }

    let mut spans = Vec::with_capacity(segments.len());
    let mut cursor = 0usize;
    for (index, segment) in segments.iter().enumerate() {
        let (start, end) = (segment.start_seconds, segment.end_seconds);
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
            return Err(Error::InvalidParameter(format!(
                "segment {} has invalid bounds [{}, {})",
                index, start, end
            )));
        }

        let span = SampleSpan {
            start: seconds_to_sample(start, sample_rate).min(frames),
            end: seconds_to_sample(end, sample_rate).min(frames),
        };
        if span.start < cursor {
            return Err(Error::InvalidParameter(format!(
                "segment {} starts before the previous segment ends",
                index
            )));
        }
        cursor = span.end;
        spans.push(span);
    }

    Ok(spans)
}

/// Length of the spliced buffer:
/// `frames - sum(span lengths) + spans * pause_samples`
///
/// `None` when the result does not fit in `usize`.
pub fn spliced_length(frames: usize, spans: &[SampleSpan], pause_samples: usize) -> Option<usize> {
    let removed: usize = spans.iter().map(SampleSpan::len).sum();
    spans
        .len()
        .checked_mul(pause_samples)?
        .checked_add(frames.checked_sub(removed)?)
}

/// Longest result a splice may produce: the larger of the input length and
/// what a 16-bit WAV `data` chunk can hold for `channel_count` channels
pub fn max_spliced_length(frames: usize, channel_count: usize) -> usize {
    let wav_frames = u32::MAX as usize / (2 * channel_count.max(1));
    frames.max(wav_frames)
}

/// Splice `segments` out of `buffer`, replacing each with a pause
pub fn splice(
    buffer: &SampleBuffer,
    segments: &[BreathSegment],
    pause_seconds: f64,
) -> Result<SampleBuffer> {
    splice_with_progress(buffer, segments, pause_seconds, &mut |_: f32| {})
}

/// [`splice`] reporting 10 at start, 10-90 across segments, 100 at the end
pub fn splice_with_progress<P: ProgressSink + ?Sized>(
    buffer: &SampleBuffer,
    segments: &[BreathSegment],
    pause_seconds: f64,
    progress: &mut P,
) -> Result<SampleBuffer> {
    if !pause_seconds.is_finite() || pause_seconds < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "pause duration must be a finite number >= 0, got {}",
            pause_seconds
        )));
    }

    let sample_rate = buffer.sample_rate();
    let frames = buffer.frames();
    let spans = resolve_spans(segments, sample_rate, frames)?;
    progress.report(10.0);

    let pause = pause_samples(pause_seconds, sample_rate);
    let channel_count = buffer.channel_count();
    let new_length = spliced_length(frames, &spans, pause)
        .filter(|&len| len <= max_spliced_length(frames, channel_count))
        .ok_or_else(|| {
            Error::InvalidParameter(format!(
                "pause of {} s per segment makes the output too long",
                pause_seconds
            ))
        })?;

    debug!(
        segments = spans.len(),
        pause_samples = pause,
        frames,
        new_length,
        "Splicing buffer"
    );

    let total_steps = (channel_count * spans.len()) as f32;
    let mut step = 0usize;

    let mut channels = Vec::with_capacity(channel_count);
    for input in buffer.channels() {
        let mut output = Vec::with_capacity(new_length);
        let mut last_end = 0usize;

        for span in &spans {
            output.extend_from_slice(&input[last_end..span.start]);
            output.resize(output.len() + pause, 0.0);
            last_end = span.end;

            step += 1;
            progress.report(10.0 + 80.0 * step as f32 / total_steps);
        }
        output.extend_from_slice(&input[last_end..]);

        debug_assert_eq!(output.len(), new_length);
        channels.push(output);
    }

    let spliced = SampleBuffer::new(channels, sample_rate)?;
    progress.report(100.0);
    Ok(spliced)
}
