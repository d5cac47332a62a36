//! # Breathcut Common Library
//!
//! Shared code for the breathcut workspace including:
//! - Error types
//! - Detection, removal and analysis parameters
//! - Configuration loading
//! - Session event types and the EventBus

pub mod config;
pub mod error;
pub mod events;
pub mod params;

pub use error::{Error, Result};
pub use params::{AnalysisSettings, DetectionParameters, RemovalParameters};
