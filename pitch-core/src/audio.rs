//! # Audio Input Module
//!
//! The detection core never talks to an audio API directly. Anything that can
//! produce mono `f32` samples implements [`AudioSource`] and hands each batch to
//! a [`SampleSink`] callback.
//!
//! ## Sources
//! - [`ReplaySource`]: plays back samples already in memory (files, tests)
//! - [`CpalSource`]: default input device through CPAL (feature `capture`)

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::error::{PitchError, Result};

/// Audio buffer size used when replaying samples, in frames.
///
/// Matches a typical device callback so replays behave like live input.
pub const BUFFER_SIZE: usize = 2048;

/// Callback receiving each batch of captured mono samples.
pub type SampleSink = Box<dyn FnMut(&[f32]) + Send>;

/// A capability that delivers mono samples until stopped.
pub trait AudioSource {
    /// Starts delivering samples to `on_samples` and returns the sample rate.
    fn start(&mut self, on_samples: SampleSink) -> Result<u32>;

    /// Stops delivery. Calling it on a stopped source does nothing.
    fn stop(&mut self);
}

/// Forwards every batch over a channel, dropping batches when it is full.
pub fn channel_sink(sender: Sender<Vec<f32>>) -> SampleSink {
    Box::new(move |data: &[f32]| {
        // Send the frame, ignoring errors if the channel is full.
        let _ = sender.try_send(data.to_vec());
    })
}

/// Replays an in-memory signal in fixed-size chunks on a background thread.
///
/// The sink is dropped once the signal is exhausted, which disconnects a
/// [`channel_sink`] and lets the receiving side finish.
pub struct ReplaySource {
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
    chunk_size: usize,
    realtime: bool,
    stop_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            sample_rate,
            chunk_size: BUFFER_SIZE,
            realtime: false,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Sets the number of samples per delivered batch (minimum 1).
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Sleeps for each chunk's duration, mimicking a live device.
    pub fn realtime(mut self, enabled: bool) -> Self {
        self.realtime = enabled;
        self
    }

    /// Blocks until the replay thread has delivered every chunk.
    ///
    /// Fails when the thread died early, e.g. because the sink panicked.
    pub fn wait(&mut self) -> Result<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        handle.join().map_err(|_| {
            warn!("replay thread panicked before the end of the stream");
            PitchError::Audio("replay thread panicked".into())
        })
    }
}

impl AudioSource for ReplaySource {
    fn start(&mut self, mut on_samples: SampleSink) -> Result<u32> {
        if self.worker.is_some() {
            return Err(PitchError::Audio("replay already running".into()));
        }
        if self.sample_rate == 0 {
            return Err(PitchError::Audio("sample rate must be positive".into()));
        }

        self.stop_flag.store(false, Ordering::SeqCst);
        let samples = Arc::clone(&self.samples);
        let stop = Arc::clone(&self.stop_flag);
        let chunk_size = self.chunk_size;
        let pace = self
            .realtime
            .then(|| Duration::from_secs_f64(chunk_size as f64 / self.sample_rate as f64));

        info!(
            samples = samples.len(),
            sample_rate = self.sample_rate,
            "starting replay"
        );
        let handle = thread::Builder::new()
            .name("replay-source".into())
            .spawn(move || {
                for chunk in samples.chunks(chunk_size) {
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                    on_samples(chunk);
                    if let Some(pace) = pace {
                        thread::sleep(pace);
                    }
                }
                debug!("replay finished");
            })
            .map_err(|e| PitchError::Audio(e.to_string()))?;

        self.worker = Some(handle);
        Ok(self.sample_rate)
    }

    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        // A panicked worker has already been logged by `wait`.
        self.wait().ok();
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(feature = "capture")]
pub use self::capture::CpalSource;

#[cfg(feature = "capture")]
mod capture {
    use cpal::SupportedStreamConfigRange;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use tracing::{error, info};

    use super::{AudioSource, SampleSink};
    use crate::error::{PitchError, Result};

    /// Captures from the default input device via CPAL.
    ///
    /// Multi-channel input is averaged down to mono inside the callback.
    pub struct CpalSource {
        target_rate: u32,
        stream: Option<cpal::Stream>,
    }

    impl CpalSource {
        /// Creates a source asking the device for `target_rate` Hz.
        pub fn new(target_rate: u32) -> Self {
            Self {
                target_rate,
                stream: None,
            }
        }
    }

    impl Default for CpalSource {
        fn default() -> Self {
            Self::new(44_100)
        }
    }

    fn audio_err(err: impl std::fmt::Display) -> PitchError {
        PitchError::Audio(err.to_string())
    }

    impl AudioSource for CpalSource {
        fn start(&mut self, mut on_samples: SampleSink) -> Result<u32> {
            if self.stream.is_some() {
                return Err(PitchError::Audio("capture already running".into()));
            }

            let host = cpal::default_host();
            let device = host
                .default_input_device()
                .ok_or_else(|| PitchError::Audio("no input device available".into()))?;

            info!("using audio input device: {}", device.name().map_err(audio_err)?);

            let configs = device
                .supported_input_configs()
                .map_err(audio_err)?
                .collect::<Vec<_>>();
            let supported = find_supported_config(configs, self.target_rate)
                .ok_or_else(|| PitchError::Audio("no suitable f32 input format found".into()))?;

            let rate = self
                .target_rate
                .clamp(supported.min_sample_rate().0, supported.max_sample_rate().0);
            let config = supported.with_sample_rate(cpal::SampleRate(rate));
            let channels = config.channels().max(1) as usize;
            let config: cpal::StreamConfig = config.into();

            info!(sample_rate = rate, channels, "selected input format");

            let mut mono = Vec::new();
            let stream = device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if channels == 1 {
                            on_samples(data);
                            return;
                        }
                        mono.clear();
                        mono.extend(
                            data.chunks(channels)
                                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
                        );
                        on_samples(&mono);
                    },
                    |err| error!("an error occurred on the audio stream: {err}"),
                    None,
                )
                .map_err(audio_err)?;

            stream.play().map_err(audio_err)?;
            self.stream = Some(stream);
            Ok(rate)
        }

        fn stop(&mut self) {
            if let Some(stream) = self.stream.take() {
                let _ = stream.pause();
                info!("audio capture stopped");
            }
        }
    }

    /// Picks the f32 configuration closest to `target_rate`, preferring mono.
    fn find_supported_config(
        configs: Vec<SupportedStreamConfigRange>,
        target_rate: u32,
    ) -> Option<SupportedStreamConfigRange> {
        configs
            .into_iter()
            .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
            .min_by_key(|c| {
                let covers =
                    c.min_sample_rate().0 <= target_rate && target_rate <= c.max_sample_rate().0;
                let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
                let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
                let distance = if covers { 0 } else { min_diff.min(max_diff) };
                (distance, c.channels())
            })
    }
}
