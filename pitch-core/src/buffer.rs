//! # Sample Accumulator Module
//!
//! Absorbs audio callbacks of any size and always exposes the most recent
//! `capacity` samples as one contiguous window for the FFT.

use crate::error::{PitchError, Result};

/// Fixed-capacity rolling window of mono samples.
///
/// Backed by a mirrored ring: every sample is written twice, `capacity` apart,
/// so the newest `capacity` samples always sit contiguously at
/// `data[head..head + capacity]`. A push costs time proportional to the batch,
/// not the window, and `snapshot` never copies.
#[derive(Debug, Clone)]
pub struct SampleAccumulator {
    data: Vec<f32>,
    capacity: usize,
    /// Next write position in `0..capacity`; also the oldest sample once full.
    head: usize,
    /// Number of valid samples (saturates at capacity).
    filled: usize,
}

impl SampleAccumulator {
    /// Creates an empty accumulator holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity * 2],
            capacity,
            head: 0,
            filled: 0,
        }
    }

    /// Appends a batch, evicting the oldest samples once the window is full.
    pub fn push(&mut self, samples: &[f32]) {
        let cap = self.capacity;
        if samples.is_empty() || cap == 0 {
            return;
        }

        // Only the tail of an oversized batch can survive.
        let tail = &samples[samples.len().saturating_sub(cap)..];
        let (front, wrapped) = tail.split_at(tail.len().min(cap - self.head));
        self.write_at(self.head, front);
        self.write_at(0, wrapped);

        self.head = (self.head + tail.len()) % cap;
        self.filled = (self.filled + samples.len()).min(cap);
    }

    fn write_at(&mut self, pos: usize, samples: &[f32]) {
        let (cap, end) = (self.capacity, pos + samples.len());
        self.data[pos..end].copy_from_slice(samples);
        self.data[pos + cap..end + cap].copy_from_slice(samples);
    }

    /// True once a full window has been accumulated.
    pub fn is_ready(&self) -> bool {
        self.capacity > 0 && self.filled == self.capacity
    }

    /// Returns the current window, oldest sample first.
    pub fn snapshot(&self) -> Result<&[f32]> {
        if !self.is_ready() {
            return Err(PitchError::NotReady {
                have: self.filled,
                need: self.capacity,
            });
        }
        Ok(&self.data[self.head..self.head + self.capacity])
    }

    /// Number of valid samples held (never more than `capacity`).
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forgets all samples; the window has to fill up again.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.head = 0;
        self.filled = 0;
    }
}
