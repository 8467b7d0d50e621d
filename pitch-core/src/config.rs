//! Engine configuration
//!
//! In-memory settings for the detection engine, optionally loaded from a JSON
//! file. Missing fields fall back to their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PitchError, Result};
use crate::tuning::STANDARD_GUITAR;

/// Default analysis window, in samples.
pub const DEFAULT_WINDOW_SIZE: usize = 4096;
/// Default input sample rate, in Hz.
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;
/// Default on-pitch tolerance, in Hz.
pub const DEFAULT_TOLERANCE: f32 = 1.0;
/// Default interval between emitted results, in milliseconds.
pub const DEFAULT_SUBSCRIPTION_MS: u64 = 250;

/// Detection engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Input sample rate in Hz
    pub sample_rate: f32,
    /// On-pitch tolerance in Hz
    pub tolerance: f32,
    /// Tuning identifiers (e.g. `["E4", "B3"]`), or `["None"]` for general mode
    pub tuning: Vec<String>,
    /// FFT window size in samples (power of two)
    pub window_size: usize,
    /// How often the scheduler should emit a result; not used by the engine
    pub subscription_duration_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            tolerance: DEFAULT_TOLERANCE,
            tuning: STANDARD_GUITAR.iter().map(|s| s.to_string()).collect(),
            window_size: DEFAULT_WINDOW_SIZE,
            subscription_duration_ms: DEFAULT_SUBSCRIPTION_MS,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    ///
    /// Falls back to the defaults (with a warning) when the file cannot be
    /// read or parsed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    info!("loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    warn!(
                        "failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                warn!(
                    "failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Checks the values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(PitchError::InvalidConfig(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(PitchError::InvalidConfig(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if self.window_size < 2 || !self.window_size.is_power_of_two() {
            return Err(PitchError::InvalidConfig(format!(
                "window size must be a power of two, got {}",
                self.window_size
            )));
        }
        Ok(())
    }
}
