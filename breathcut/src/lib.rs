//! # Breathcut (breathcut)
//!
//! Breath detection and removal for recorded speech.
//!
//! **Purpose:** Decode an audio file, find low-energy regions between
//! phrases, cut them out of every channel and write the result back as
//! 16-bit PCM WAV with a fixed pause in place of each breath.
//!
//! **Architecture:** Pure DSP services (energy analysis, detection, splicing,
//! WAV codec) driven by a [`session::ProcessingSession`] that runs them on
//! tokio's blocking pool and reports progress on an EventBus.

pub mod audio;
pub mod error;
pub mod progress;
pub mod services;
pub mod session;

pub use audio::{AudioInfo, SampleBuffer};
pub use error::{Error, Result};
pub use services::BreathSegment;
pub use session::ProcessingSession;
