//! Signal-processing services
//!
//! Energy analysis feeds breath detection; detected segments feed the
//! splicer. All three are pure functions of their inputs.

pub mod breath_detector;
pub mod buffer_splicer;
pub mod energy_analyzer;

pub use breath_detector::{merge_close_segments, BreathDetector, BreathSegment};
pub use buffer_splicer::{splice, splice_with_progress};
pub use energy_analyzer::{EnergyProfile, EnergyWindow};
