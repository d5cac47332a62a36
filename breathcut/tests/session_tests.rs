//! Processing session: lifecycle, events and failure semantics

mod helpers;

use breathcut::{BreathSegment, Error, ProcessingSession};
use breathcut_common::events::{Operation, SessionEvent};
use breathcut_common::{AnalysisSettings, DetectionParameters, RemovalParameters};
use helpers::{generate_wav_bytes, tone_with_gaps, AudioConfig};
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;

fn speech_config() -> AudioConfig {
    AudioConfig::default().with_gaps(&[(0.3, 0.6)])
}

/// Drain everything currently queued on the receiver
fn drain(rx: &mut Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn progress_of(events: &[SessionEvent], op: Operation) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Progress { operation, percent, .. } if *operation == op => Some(*percent),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn load_analyze_remove_export() {
    let mut session = ProcessingSession::new(AnalysisSettings::default());
    let bytes = generate_wav_bytes(&speech_config(), 16, hound::SampleFormat::Int).unwrap();

    let info = session.load(bytes).await.unwrap();
    assert_eq!(info.sample_rate, 44100);
    assert_eq!(info.channels, 1);
    assert_eq!(info.frames, 44100);
    assert!((info.duration_seconds - 1.0).abs() < 1e-9);

    let segments = session.analyze(DetectionParameters::default()).await.unwrap();
    assert_eq!(segments.len(), 1);

    let spliced = session
        .remove(&[BreathSegment::new(0.3, 0.6)], RemovalParameters::new(0.1))
        .await
        .unwrap();
    assert_eq!(spliced.frames(), 35280);

    let wav = session.export().await.unwrap();
    assert_eq!(wav.len(), 44 + 35280 * 2);
}

#[tokio::test]
async fn progress_events_are_monotonic_per_operation() {
    let mut session = ProcessingSession::new(AnalysisSettings::default());
    let mut rx = session.subscribe();
    session.load_buffer(tone_with_gaps(&speech_config()));

    session.analyze(DetectionParameters::default()).await.unwrap();
    session
        .remove(&[BreathSegment::new(0.3, 0.6)], RemovalParameters::default())
        .await
        .unwrap();
    let events = drain(&mut rx);

    assert!(events.iter().all(|e| e.session_id() == session.id()));

    for op in [Operation::Analyze, Operation::Remove] {
        let percents = progress_of(&events, op);
        assert!(!percents.is_empty(), "{} reported no progress", op);
        assert!(percents.windows(2).all(|w| w[0] < w[1]), "{}: {:?}", op, percents);
        assert_eq!(percents.last(), Some(&100));
    }
    assert_eq!(progress_of(&events, Operation::Analyze)[0], 10);
    assert_eq!(progress_of(&events, Operation::Remove)[0], 10);

    // Started precedes progress, which precedes completion
    let analyze: Vec<_> = events.iter().filter(|e| e.operation() == Operation::Analyze).collect();
    assert!(matches!(analyze.first(), Some(SessionEvent::OperationStarted { .. })));
    assert!(matches!(analyze.last(), Some(SessionEvent::OperationCompleted { .. })));
}

#[tokio::test]
async fn failures_emit_event_and_keep_state() {
    let mut session = ProcessingSession::new(AnalysisSettings::default());
    let mut rx = session.subscribe();
    session.load_buffer(tone_with_gaps(&speech_config()));
    let before = session.current_buffer().unwrap();

    let result = session.load(b"not audio at all".to_vec()).await;
    assert!(matches!(result, Err(Error::Format(_))));

    let result = session.remove(&[], RemovalParameters::default()).await;
    assert!(matches!(result, Err(Error::EmptySegments)));

    assert!(Arc::ptr_eq(&before, &session.current_buffer().unwrap()));

    let failed: Vec<Operation> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::OperationFailed { operation, .. } => Some(operation),
            _ => None,
        })
        .collect();
    assert_eq!(failed, vec![Operation::Decode, Operation::Remove]);
}

#[tokio::test]
async fn analyze_is_repeatable_with_different_parameters() {
    let mut session = ProcessingSession::new(AnalysisSettings::default());
    session.load_buffer(tone_with_gaps(&speech_config()));

    let default = session.analyze(DetectionParameters::default()).await.unwrap();
    let strict = session.analyze(DetectionParameters::new(50, 400)).await.unwrap();
    let again = session.analyze(DetectionParameters::default()).await.unwrap();

    assert_eq!(default.len(), 1);
    assert!(strict.is_empty());
    assert_eq!(default, again);
}

#[tokio::test]
async fn custom_merge_gap_is_honoured() {
    // Silent windows span [0.10, 0.20) and [0.26, 0.34): a 60ms gap
    let config = AudioConfig::default().with_gaps(&[(0.1, 0.2), (0.25, 0.35)]);
    let params = DetectionParameters::new(50, 50);

    let narrow_settings = AnalysisSettings {
        merge_gap_ms: 20,
        ..AnalysisSettings::default()
    };
    let mut narrow = ProcessingSession::new(narrow_settings);
    narrow.load_buffer(tone_with_gaps(&config));
    assert_eq!(narrow.analyze(params).await.unwrap().len(), 2);

    let mut wide = ProcessingSession::new(AnalysisSettings::default());
    wide.load_buffer(tone_with_gaps(&config));
    assert_eq!(wide.analyze(params).await.unwrap().len(), 1);
}

#[tokio::test]
async fn stereo_channels_stay_aligned_through_export() {
    let config = AudioConfig {
        channels: 2,
        ..speech_config()
    };
    let mut session = ProcessingSession::new(AnalysisSettings::default());
    session.load_buffer(tone_with_gaps(&config));

    let segments = session.analyze(DetectionParameters::default()).await.unwrap();
    session.remove(&segments, RemovalParameters::default()).await.unwrap();
    let bytes = session.export().await.unwrap();

    let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
    assert_eq!(reader.spec().channels, 2);
    let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
    assert!(samples.chunks(2).all(|frame| frame[0] == frame[1]));
}
