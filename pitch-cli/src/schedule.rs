//! Emission cadence.
//!
//! The engine has no notion of time. When replaying a file as fast as
//! possible, wall-clock timers would fire at random points of the signal, so
//! the cadence is counted in samples instead.

use std::time::Duration;

/// Counts samples and reports how many emission intervals have elapsed.
#[derive(Debug, Clone)]
pub struct SampleClock {
    interval: usize,
    pending: usize,
}

impl SampleClock {
    /// A clock ticking every `interval` of audio at `sample_rate`.
    pub fn new(interval: Duration, sample_rate: u32) -> Self {
        let samples = (interval.as_secs_f64() * sample_rate as f64).round() as usize;
        Self {
            interval: samples.max(1),
            pending: 0,
        }
    }

    /// Samples per tick.
    pub fn interval(&self) -> usize {
        self.interval
    }

    /// Advances by `samples` and returns the number of ticks crossed.
    pub fn advance(&mut self, samples: usize) -> usize {
        self.pending += samples;
        let ticks = self.pending / self.interval;
        self.pending %= self.interval;
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_second_at_cd_rate() {
        let clock = SampleClock::new(Duration::from_millis(250), 44_100);
        assert_eq!(clock.interval(), 11_025);
    }

    #[test]
    fn ticks_carry_remainders() {
        let mut clock = SampleClock::new(Duration::from_millis(100), 1_000);
        assert_eq!(clock.advance(60), 0);
        assert_eq!(clock.advance(60), 1);
        assert_eq!(clock.advance(80), 1);
        assert_eq!(clock.advance(250), 2);
        assert_eq!(clock.advance(50), 1);
    }

    #[test]
    fn zero_interval_still_ticks() {
        let mut clock = SampleClock::new(Duration::ZERO, 44_100);
        assert_eq!(clock.interval(), 1);
        assert_eq!(clock.advance(3), 3);
    }
}
