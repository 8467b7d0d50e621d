// pitch-core/src/lib.rs

//! The core logic for the streaming pitch detector.
//! This crate turns a stream of mono audio samples into a detected frequency
//! and classifies it against a tuning (e.g. guitar strings) or the full
//! chromatic note table. It is completely headless and contains no timers or
//! platform audio code beyond the optional CPAL source.
//!
//! ## Example
//! ```rust
//! use pitch_core::PitchEngine;
//!
//! let mut engine = PitchEngine::new();
//! let tone: Vec<f32> = (0..4096)
//!     .map(|i| (2.0 * std::f32::consts::PI * 110.0 * i as f32 / 44_100.0).sin())
//!     .collect();
//! engine.push_samples(&tone);
//!
//! if let Some(result) = engine.emit() {
//!     println!("{}{} on pitch: {}", result.note, result.octave, result.is_on_pitch);
//! }
//! ```

pub mod audio;
pub mod buffer;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod fft;
pub mod pitch;
pub mod tuning;

pub use audio::{AudioSource, ReplaySource, SampleSink, channel_sink};
#[cfg(feature = "capture")]
pub use audio::CpalSource;
pub use buffer::SampleAccumulator;
pub use classify::{Classification, ClassificationMode, classify};
pub use config::EngineConfig;
pub use engine::PitchEngine;
pub use error::{PitchError, Result};
pub use pitch::SpectralAnalyzer;
pub use tuning::{NoteEntry, NoteTable, STANDARD_GUITAR, TuningTarget, parse_tuning};
