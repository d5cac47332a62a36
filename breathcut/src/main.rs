//! Breathcut - command-line entry point
//!
//! Loads one audio file, detects breaths, removes them and writes the result
//! as 16-bit PCM WAV.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use breathcut::audio::decoder;
use breathcut::{BreathSegment, ProcessingSession};
use breathcut_common::config::load_config;
use breathcut_common::events::SessionEvent;
use breathcut_common::{DetectionParameters, RemovalParameters};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Log level used until the config file has been read
const DEFAULT_LOG_LEVEL: &str = "info";

/// Command-line arguments for breathcut
#[derive(Parser, Debug)]
#[command(name = "breathcut")]
#[command(about = "Detect and remove breaths from recorded speech")]
#[command(version)]
struct Args {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC/M4A)
    input: PathBuf,

    /// Output WAV file (default: <input stem>_nobreath.wav next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Detection sensitivity percent 0-100
    #[arg(short, long)]
    sensitivity: Option<u8>,

    /// Minimum breath duration in milliseconds
    #[arg(long)]
    min_duration_ms: Option<u32>,

    /// Pause inserted in place of each breath, in seconds
    #[arg(short, long)]
    pause: Option<f64>,

    /// Config file path
    #[arg(short, long, env = "BREATHCUT_CONFIG")]
    config: Option<PathBuf>,

    /// Only report detected breaths; write nothing
    #[arg(long)]
    analyze_only: bool,

    /// Print detected segments as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing before config loading so its messages are kept;
    // the configured level is applied once the file is read
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) = reload::Layer::new(
        env_filter.unwrap_or_else(|| EnvFilter::new(log_directives(DEFAULT_LOG_LEVEL))),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if !from_env {
        filter_handle
            .reload(EnvFilter::new(log_directives(&config.logging.level)))
            .context("Failed to apply configured log level")?;
    }

    let detection = DetectionParameters {
        sensitivity: args.sensitivity.unwrap_or(config.detection.sensitivity),
        min_duration_ms: args.min_duration_ms.unwrap_or(config.detection.min_duration_ms),
    };
    let removal = RemovalParameters {
        pause_seconds: args.pause.unwrap_or(config.removal.pause_seconds),
    };

    let mut session = ProcessingSession::new(config.analysis);
    let progress_task = tokio::spawn(log_progress(session.subscribe()));

    info!("Loading {}", args.input.display());
    let loaded = if is_wav(&args.input) {
        let bytes = tokio::fs::read(&args.input)
            .await
            .with_context(|| format!("Failed to read {}", args.input.display()))?;
        session.load(bytes).await
    } else {
        // Compressed formats go through symphonia
        let path = args.input.clone();
        tokio::task::spawn_blocking(move || decoder::decode_media_file(&path))
            .await?
            .map(|buffer| session.load_buffer(buffer))
    };
    let audio_info =
        loaded.with_context(|| format!("Failed to decode {}", args.input.display()))?;

    info!(
        "Loaded {:.2}s, {} Hz, {} channel(s)",
        audio_info.duration_seconds, audio_info.sample_rate, audio_info.channels
    );

    let segments = session
        .analyze(detection)
        .await
        .context("Breath analysis failed")?;
    print_segments(&segments, args.json)?;

    if args.analyze_only {
        progress_task.abort();
        return Ok(());
    }
    if segments.is_empty() {
        warn!("No breaths detected; nothing written");
        progress_task.abort();
        return Ok(());
    }

    let spliced = session
        .remove(&segments, removal)
        .await
        .context("Breath removal failed")?;
    let bytes = session.export().await.context("WAV export failed")?;

    let output = args.output.unwrap_or_else(|| default_output_path(&args.input));
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        "Wrote {} ({:.2}s, {} breath(s) removed)",
        output.display(),
        spliced.duration_seconds(),
        segments.len()
    );

    progress_task.abort();
    Ok(())
}

/// Log session progress until the session's bus closes
async fn log_progress(mut rx: tokio::sync::broadcast::Receiver<SessionEvent>) {
    loop {
        match rx.recv().await {
            Ok(SessionEvent::Progress { operation, percent, .. }) => {
                tracing::debug!("{}: {}%", operation, percent);
            }
            Ok(SessionEvent::OperationCompleted { operation, elapsed_ms, .. }) => {
                info!("{} finished in {} ms", operation, elapsed_ms);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Progress display lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_segments(segments: &[BreathSegment], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(segments)?);
        return Ok(());
    }

    if segments.is_empty() {
        println!("No breaths detected");
        return Ok(());
    }
    for (index, segment) in segments.iter().enumerate() {
        println!(
            "{:>3}  {:>9.3}s - {:>9.3}s  ({:.0} ms)",
            index + 1,
            segment.start_seconds,
            segment.end_seconds,
            segment.duration() * 1000.0
        );
    }
    let total: f64 = segments.iter().map(BreathSegment::duration).sum();
    println!("{} breath(s), {:.2}s total", segments.len(), total);
    Ok(())
}

/// EnvFilter directives enabling `level` for the breathcut crates
fn log_directives(level: &str) -> String {
    format!("breathcut={0},breathcut_common={0}", level)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

/// `<dir>/<stem>_nobreath.wav`
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_nobreath.wav", stem))
}
