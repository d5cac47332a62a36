//! Audio containers and sample buffers

pub mod decoder;
pub mod types;
pub mod wav;

pub use types::{AudioInfo, SampleBuffer};
