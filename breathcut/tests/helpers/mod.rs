//! Test Helper Utilities
//!
//! Shared utilities for testing breathcut

#![allow(dead_code)]

pub mod audio_generator;

pub use audio_generator::{generate_test_wav, generate_wav_bytes, tone_with_gaps, AudioConfig};
