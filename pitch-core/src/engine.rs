//! # Detection Engine Module
//!
//! Ties the pipeline together: samples go into the accumulator, every full
//! window is analyzed, and the latest in-range frequency is kept until a
//! scheduler asks for a classification via [`PitchEngine::emit`].
//!
//! The engine holds no timers and never blocks. It is `Send`, so it can live on
//! a dedicated processing thread; share it behind a single `Mutex` if samples
//! and `emit` calls come from different threads.

use tracing::{debug, info};

use crate::buffer::SampleAccumulator;
use crate::classify::{Classification, classify};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::pitch::{SpectralAnalyzer, is_valid_frequency};
use crate::tuning::{NoteTable, TuningTarget, parse_tuning};

/// Streaming pitch detector and classifier.
#[derive(Debug)]
pub struct PitchEngine {
    config: EngineConfig,
    table: &'static NoteTable,
    targets: Vec<TuningTarget>,
    accumulator: SampleAccumulator,
    analyzer: SpectralAnalyzer,
    latest_frequency: f32,
    paused: bool,
}

impl PitchEngine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }

    /// Creates an engine with a validated configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        let table = NoteTable::standard();
        Self {
            targets: parse_tuning(&config.tuning, table),
            accumulator: SampleAccumulator::new(config.window_size),
            analyzer: SpectralAnalyzer::new(config.window_size),
            table,
            latest_frequency: 0.0,
            paused: false,
            config,
        }
    }

    /// Applies a new configuration.
    ///
    /// The tuning is re-parsed against the cached note table. Changing the
    /// window size discards the buffered samples. On error nothing changes.
    pub fn configure(&mut self, config: EngineConfig) -> Result<()> {
        config.validate()?;

        if config.window_size != self.config.window_size {
            self.accumulator = SampleAccumulator::new(config.window_size);
            self.analyzer = SpectralAnalyzer::new(config.window_size);
        }
        self.targets = parse_tuning(&config.tuning, self.table);

        info!(
            sample_rate = config.sample_rate,
            tolerance = config.tolerance,
            window = config.window_size,
            targets = self.targets.len(),
            "engine configured"
        );
        self.config = config;
        Ok(())
    }

    /// Changes sample rate, tolerance and tuning, keeping everything else.
    pub fn configure_with<S: AsRef<str>>(
        &mut self,
        sample_rate: f32,
        tolerance: f32,
        tuning: &[S],
    ) -> Result<()> {
        let config = EngineConfig {
            sample_rate,
            tolerance,
            tuning: tuning.iter().map(|s| s.as_ref().to_string()).collect(),
            ..self.config.clone()
        };
        self.configure(config)
    }

    /// Feeds a batch of mono samples of any size.
    ///
    /// Once a full window is available it is analyzed right away. Only
    /// detections strictly inside (80, 2000) Hz replace the latest frequency;
    /// silence or out-of-range peaks keep the previous value. Ignored while
    /// paused.
    pub fn push_samples(&mut self, samples: &[f32]) {
        if self.paused || samples.is_empty() {
            return;
        }

        self.accumulator.push(samples);
        let Ok(window) = self.accumulator.snapshot() else {
            return;
        };

        let detected = self.analyzer.analyze(window, self.config.sample_rate);
        if is_valid_frequency(detected) {
            self.latest_frequency = detected;
        } else {
            debug!(detected, kept = self.latest_frequency, "no in-range pitch");
        }
    }

    /// True once a full analysis window has been accumulated.
    pub fn is_ready(&self) -> bool {
        self.accumulator.is_ready()
    }

    /// Most recent in-range detection in Hz, `0.0` before the first one.
    pub fn latest_frequency(&self) -> f32 {
        self.latest_frequency
    }

    /// Classifies the latest detection.
    ///
    /// Returns `None` while paused or before anything has been detected.
    pub fn emit(&self) -> Option<Classification> {
        if self.paused || self.latest_frequency <= 0.0 {
            return None;
        }
        Some(classify(
            self.latest_frequency,
            self.config.tolerance,
            &self.targets,
            self.table,
        ))
    }

    /// Stops analysing incoming samples and emitting results.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Drops buffered samples and the latest detection.
    pub fn reset(&mut self) {
        self.accumulator.clear();
        self.latest_frequency = 0.0;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolved tuning targets; empty in general mode.
    pub fn targets(&self) -> &[TuningTarget] {
        &self.targets
    }

    pub fn table(&self) -> &'static NoteTable {
        self.table
    }

    /// Magnitude spectrum of the last analyzed window.
    pub fn magnitudes(&self) -> &[f32] {
        self.analyzer.magnitudes()
    }
}

impl Default for PitchEngine {
    fn default() -> Self {
        Self::new()
    }
}
