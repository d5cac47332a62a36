//! Compressed-format decoding
//!
//! Decodes MP3, FLAC, AAC/M4A, OGG Vorbis (and WAV) through symphonia into a
//! planar [`SampleBuffer`]. Channels are kept separate; analysis picks its
//! own channel downstream.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Decode an audio file of any supported format
pub fn decode_media_file(file_path: &Path) -> Result<SampleBuffer> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path)?;
    let extension = file_path.extension().and_then(|e| e.to_str());
    decode_source(Box::new(file), extension)
}

/// Decode in-memory audio bytes, optionally hinted by file extension
pub fn decode_media_bytes(bytes: Vec<u8>, extension_hint: Option<&str>) -> Result<SampleBuffer> {
    decode_source(Box::new(Cursor::new(bytes)), extension_hint)
}

fn decode_source(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<SampleBuffer> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to probe audio: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("Sample rate unknown".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // End of stream
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(Error::Decode(format!("Error reading packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_planar(&decoded, &mut channels),
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt frame; keep going with the rest of the stream
                tracing::warn!("Skipping undecodable packet: {}", e);
            }
            Err(e) => return Err(Error::Decode(format!("Failed to decode packet: {}", e))),
        }
    }

    if channels.is_empty() {
        return Err(Error::Decode("Stream contained no audio frames".to_string()));
    }

    let buffer = SampleBuffer::new(channels, sample_rate)?;
    tracing::debug!(
        sample_rate,
        channels = buffer.channel_count(),
        frames = buffer.frames(),
        duration_seconds = format!("{:.2}", buffer.duration_seconds()),
        "Audio decoding complete"
    );
    Ok(buffer)
}

/// Append one decoded packet to the planar channel vectors
fn append_planar(decoded: &AudioBufferRef, channels: &mut Vec<Vec<f32>>) {
    match decoded {
        AudioBufferRef::F32(buf) => append_channels(buf, channels),
        AudioBufferRef::F64(buf) => append_channels(buf, channels),
        AudioBufferRef::U8(buf) => append_channels(buf, channels),
        AudioBufferRef::U16(buf) => append_channels(buf, channels),
        AudioBufferRef::U24(buf) => append_channels(buf, channels),
        AudioBufferRef::U32(buf) => append_channels(buf, channels),
        AudioBufferRef::S8(buf) => append_channels(buf, channels),
        AudioBufferRef::S16(buf) => append_channels(buf, channels),
        AudioBufferRef::S24(buf) => append_channels(buf, channels),
        AudioBufferRef::S32(buf) => append_channels(buf, channels),
    }
}

fn append_channels<S>(buf: &AudioBuffer<S>, channels: &mut Vec<Vec<f32>>)
where
    S: Sample,
    f32: FromSample<S>,
{
    let num_channels = buf.spec().channels.count();
    if channels.is_empty() {
        channels.resize_with(num_channels, Vec::new);
    }

    for (ch, output) in channels.iter_mut().enumerate().take(num_channels) {
        output.extend(buf.chan(ch).iter().map(|&s| f32::from_sample(s)));
    }
}
