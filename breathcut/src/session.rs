//! Processing session
//!
//! Owns the currently loaded sample buffer and drives load, analyze, remove
//! and export. CPU-bound work runs on tokio's blocking pool; progress comes
//! back over the session's EventBus as [`SessionEvent`]s.
//!
//! **Single-writer discipline:** every operation takes `&mut self`, so the
//! borrow checker rules out two in-flight operations on one session. There
//! are no internal locks and no cancellation; an operation runs to
//! completion or failure. A failed operation leaves the held buffer as it
//! was.

use crate::audio::types::{AudioInfo, SampleBuffer};
use crate::audio::wav;
use crate::error::{Error, Result};
use crate::progress::{ProgressReporter, ProgressSink};
use crate::services::breath_detector::{BreathDetector, BreathSegment};
use crate::services::buffer_splicer::splice_with_progress;
use crate::services::energy_analyzer::EnergyProfile;
use breathcut_common::events::{EventBus, Operation, SessionEvent};
use breathcut_common::{AnalysisSettings, DetectionParameters, RemovalParameters};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default EventBus capacity per session
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Channel used for energy analysis
pub const ANALYSIS_CHANNEL: usize = 0;

/// A breath-removal session over one in-memory buffer
pub struct ProcessingSession {
    id: Uuid,
    settings: AnalysisSettings,
    event_bus: EventBus,
    buffer: Option<Arc<SampleBuffer>>,
}

impl ProcessingSession {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self::with_event_capacity(settings, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(settings: AnalysisSettings, capacity: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            event_bus: EventBus::new(capacity),
            buffer: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Subscribe to this session's events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.event_bus.subscribe()
    }

    /// Handle to the held buffer, if one is loaded
    pub fn current_buffer(&self) -> Option<Arc<SampleBuffer>> {
        self.buffer.clone()
    }

    /// Format summary of the held buffer
    pub fn info(&self) -> Option<AudioInfo> {
        self.buffer.as_ref().map(|b| b.info())
    }

    /// Decode WAV bytes and make the result the held buffer
    pub async fn load(&mut self, bytes: Vec<u8>) -> Result<AudioInfo> {
        debug!(session = %self.id, bytes = bytes.len(), "Loading audio");

        let buffer = self
            .run_worker(Operation::Decode, move |progress| {
                wav::decode_with_progress(&bytes, progress)
            })
            .await?;

        Ok(self.replace_buffer(buffer))
    }

    /// Hold a buffer decoded elsewhere (compressed formats, generated audio)
    pub fn load_buffer(&mut self, buffer: SampleBuffer) -> AudioInfo {
        self.replace_buffer(buffer)
    }

    /// Detect breath segments in the held buffer
    ///
    /// Does not modify the held buffer; identical parameters on an unchanged
    /// buffer always give identical segments.
    pub async fn analyze(&mut self, params: DetectionParameters) -> Result<Vec<BreathSegment>> {
        let buffer = self.require_buffer(Operation::Analyze)?;
        if let Err(e) = params.validate() {
            return Err(self.reject(Operation::Analyze, e.into()));
        }

        let settings = self.settings;
        let detector = BreathDetector::from_parameters(&params, &settings);

        let segments = self
            .run_worker(Operation::Analyze, move |progress| {
                progress.report(10.0);
                let samples = buffer.channel(ANALYSIS_CHANNEL).unwrap_or_default();
                let profile = EnergyProfile::compute_with_progress(
                    samples,
                    buffer.sample_rate(),
                    &settings,
                    progress,
                );
                let segments = detector.detect_with_progress(&profile, progress);
                progress.report(100.0);
                Ok(segments)
            })
            .await?;

        info!(
            session = %self.id,
            sensitivity = params.sensitivity,
            min_duration_ms = params.min_duration_ms,
            breaths = segments.len(),
            total_seconds = segments.iter().map(BreathSegment::duration).sum::<f64>(),
            "Breath analysis complete"
        );
        Ok(segments)
    }

    /// Remove `segments` from the held buffer, inserting a pause for each
    ///
    /// The spliced buffer replaces the held one, which is dropped.
    pub async fn remove(
        &mut self,
        segments: &[BreathSegment],
        params: RemovalParameters,
    ) -> Result<Arc<SampleBuffer>> {
        let buffer = self.require_buffer(Operation::Remove)?;
        if segments.is_empty() {
            return Err(self.reject(Operation::Remove, Error::EmptySegments));
        }
        if let Err(e) = params.validate() {
            return Err(self.reject(Operation::Remove, e.into()));
        }

        let segments = segments.to_vec();
        let spliced = self
            .run_worker(Operation::Remove, move |progress| {
                splice_with_progress(&buffer, &segments, params.pause_seconds, progress)
            })
            .await?;

        let removed_frames = self
            .buffer
            .as_ref()
            .map_or(0, |old| old.frames().saturating_sub(spliced.frames()));
        info!(
            session = %self.id,
            removed_frames,
            new_frames = spliced.frames(),
            "Breaths removed"
        );

        let spliced = Arc::new(spliced);
        self.buffer = Some(Arc::clone(&spliced));
        Ok(spliced)
    }

    /// Encode the held buffer as 16-bit PCM WAV
    pub async fn export(&mut self) -> Result<Vec<u8>> {
        let buffer = self.require_buffer(Operation::Encode)?;
        let bytes = self
            .run_worker(Operation::Encode, move |progress| {
                Ok(wav::encode_with_progress(&buffer, progress))
            })
            .await?;

        debug!(session = %self.id, bytes = bytes.len(), "Export complete");
        Ok(bytes)
    }

    fn replace_buffer(&mut self, buffer: SampleBuffer) -> AudioInfo {
        let info = buffer.info();
        info!(
            session = %self.id,
            sample_rate = info.sample_rate,
            channels = info.channels,
            duration_seconds = format!("{:.2}", info.duration_seconds),
            "Audio loaded"
        );
        self.buffer = Some(Arc::new(buffer));
        info
    }

    fn require_buffer(&self, operation: Operation) -> Result<Arc<SampleBuffer>> {
        match &self.buffer {
            Some(buffer) => Ok(Arc::clone(buffer)),
            None => Err(self.reject(operation, Error::NoBuffer)),
        }
    }

    /// Report a failure that happened before any worker started
    fn reject(&self, operation: Operation, error: Error) -> Error {
        warn!(session = %self.id, %operation, "Operation rejected: {}", error);
        self.event_bus.emit_lossy(SessionEvent::OperationFailed {
            session_id: self.id,
            operation,
            message: error.to_string(),
            timestamp: Utc::now(),
        });
        error
    }

    /// Run `work` on the blocking pool with a fresh progress reporter
    async fn run_worker<T, F>(&self, operation: Operation, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ProgressReporter) -> Result<T> + Send + 'static,
    {
        self.event_bus.emit_lossy(SessionEvent::OperationStarted {
            session_id: self.id,
            operation,
            timestamp: Utc::now(),
        });

        let started = Instant::now();
        let mut reporter = ProgressReporter::new(self.event_bus.clone(), self.id, operation);
        let result = tokio::task::spawn_blocking(move || work(&mut reporter))
            .await
            .map_err(Error::from)
            .and_then(|r| r);

        match result {
            Ok(value) => {
                self.event_bus.emit_lossy(SessionEvent::OperationCompleted {
                    session_id: self.id,
                    operation,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    timestamp: Utc::now(),
                });
                Ok(value)
            }
            Err(error) => Err(self.reject(operation, error)),
        }
    }
}
