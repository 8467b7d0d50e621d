//! # pitch-cli - headless tuner driver
//!
//! Feeds audio into the detection engine and prints one JSON classification
//! per emission interval on stdout. Logs go to stderr.
//!
//! ## Architecture
//! - **Source Thread**: replays a WAV file (or captures the microphone with the
//!   `capture` feature) and sends sample batches over a crossbeam channel
//! - **Main Thread**: pushes batches into the engine and emits on a cadence

mod schedule;
mod wav;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::Receiver;
use pitch_core::{
    AudioSource, Classification, EngineConfig, PitchEngine, ReplaySource, channel_sink,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use schedule::SampleClock;

#[derive(Parser, Debug)]
#[command(
    name = "pitch-cli",
    about = "Detect the dominant pitch of an audio stream and classify it against a tuning"
)]
struct Cli {
    /// WAV file to analyze
    #[arg(long, required_unless_present = "mic")]
    wav: Option<PathBuf>,
    /// Capture from the default input device instead of a file
    #[arg(long, conflicts_with = "wav")]
    mic: bool,
    /// JSON engine configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// On-pitch tolerance in Hz
    #[arg(long)]
    tolerance: Option<f32>,
    /// Comma-separated tuning, e.g. E4,B3,G3 (use None for general mode)
    #[arg(long, value_delimiter = ',')]
    tuning: Option<Vec<String>>,
    /// FFT window size in samples (power of two)
    #[arg(long)]
    window: Option<usize>,
    /// Milliseconds between emitted results
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Replay the file at its natural speed
    #[arg(long)]
    realtime: bool,
    /// How long to capture in mic mode, in seconds
    #[arg(long, default_value_t = 10)]
    seconds: u64,
    /// Print the legacy eleven-value array instead of a JSON object
    #[arg(long)]
    values: bool,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:?}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path),
        None => EngineConfig::default(),
    };
    if let Some(tolerance) = cli.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(tuning) = &cli.tuning {
        config.tuning = tuning.clone();
    }
    if let Some(window) = cli.window {
        config.window_size = window;
    }
    if let Some(ms) = cli.interval_ms {
        config.subscription_duration_ms = ms;
    }

    let mut out = Output::new(cli.values);
    match &cli.wav {
        Some(path) => run_file(path, config, cli.realtime, &mut out),
        None => run_mic(config, Duration::from_secs(cli.seconds), &mut out),
    }
}

/// Replays a WAV file through the engine, emitting every interval of audio.
fn run_file(
    path: &std::path::Path,
    mut config: EngineConfig,
    realtime: bool,
    out: &mut Output,
) -> Result<()> {
    let (samples, sample_rate) = wav::read_mono(path)?;
    info!(
        path = %path.display(),
        samples = samples.len(),
        sample_rate,
        "loaded audio file"
    );
    config.sample_rate = sample_rate as f32;
    let interval = Duration::from_millis(config.subscription_duration_ms);
    let mut engine = PitchEngine::with_config(config).context("invalid engine configuration")?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut source = ReplaySource::new(samples, sample_rate).realtime(realtime);
    source.start(channel_sink(tx))?;

    let mut clock = SampleClock::new(interval, sample_rate);
    let batches = pump(&rx, &mut engine, |engine, batch_len| {
        for _ in 0..clock.advance(batch_len) {
            out.emit(engine.emit())?;
        }
        Ok(())
    })?;
    source.wait()?;

    let emitted = out.written;
    if emitted == 0 {
        warn!("no pitch detected in {}", path.display());
    }
    info!(batches, emitted, "finished");
    Ok(())
}

/// Drains `rx` into the engine, calling `on_batch` after each batch.
/// Returns the number of batches processed.
fn pump(
    rx: &Receiver<Vec<f32>>,
    engine: &mut PitchEngine,
    mut on_batch: impl FnMut(&PitchEngine, usize) -> Result<()>,
) -> Result<usize> {
    let mut batches = 0usize;
    for batch in rx.iter() {
        engine.push_samples(&batch);
        on_batch(engine, batch.len())?;
        batches += 1;
    }
    Ok(batches)
}

#[cfg(feature = "capture")]
fn run_mic(mut config: EngineConfig, duration: Duration, out: &mut Output) -> Result<()> {
    use crossbeam_channel::{after, select, tick};
    use pitch_core::CpalSource;

    let mut source = CpalSource::new(config.sample_rate.round() as u32);
    let (tx, rx) = crossbeam_channel::bounded(64);
    let sample_rate = source.start(channel_sink(tx))?;
    config.sample_rate = sample_rate as f32;

    let ticker = tick(Duration::from_millis(config.subscription_duration_ms.max(1)));
    let mut engine = PitchEngine::with_config(config).context("invalid engine configuration")?;
    let deadline = after(duration);

    loop {
        select! {
            recv(rx) -> batch => match batch {
                Ok(batch) => engine.push_samples(&batch),
                Err(_) => break,
            },
            recv(ticker) -> _ => out.emit(engine.emit())?,
            recv(deadline) -> _ => break,
        }
    }

    source.stop();
    info!("capture finished");
    Ok(())
}

#[cfg(not(feature = "capture"))]
fn run_mic(_config: EngineConfig, _duration: Duration, _out: &mut Output) -> Result<()> {
    anyhow::bail!("microphone input needs the `capture` feature")
}

/// Writes results as JSON lines.
struct Output {
    values: bool,
    written: usize,
    stdout: std::io::Stdout,
}

impl Output {
    fn new(values: bool) -> Self {
        Self {
            values,
            written: 0,
            stdout: std::io::stdout(),
        }
    }

    fn emit(&mut self, result: Option<Classification>) -> Result<()> {
        let Some(result) = result else {
            return Ok(());
        };
        let line = if self.values {
            serde_json::to_string(&result.to_values())?
        } else {
            serde_json::to_string(&result)?
        };
        let mut lock = self.stdout.lock();
        writeln!(lock, "{line}").context("failed to write result")?;
        self.written += 1;
        Ok(())
    }
}
