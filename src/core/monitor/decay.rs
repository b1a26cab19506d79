//! Weighted decay over a short ring of per-tick usage fractions.
//!
//! Every percentage metric (per-process CPU, aggregate user/nice/system/idle)
//! is fed from a monotonically increasing tick counter. Each pass turns the
//! counter delta into a fraction of the elapsed ticks, stores it in an
//! eight-slot ring and reports an exponentially decayed mean of the newest
//! three slots.

use serde::{Deserialize, Serialize};

/// Depth of the history ring. Only the newest three slots are weighted.
pub const RING_DEPTH: usize = 8;

/// Weight of the current tick.
pub const WEIGHT_1: f64 = 66.53;
/// Weight of the previous tick.
pub const WEIGHT_2: f64 = 24.47;
/// Weight of the tick before that.
pub const WEIGHT_3: f64 = 9.00;

/// Ring buffer plus counter snapshot for one decayed metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecayRing {
    ring: [f64; RING_DEPTH],
    index: usize,
    last_counter: u64,
    weighted: f64,
}

impl DecayRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest raw counter value and return the weighted percentage.
    ///
    /// With `elapsed_ticks == 0` the ring is left alone and the previous
    /// weighted value is returned. The counter snapshot is replaced in every
    /// case.
    pub fn advance(&mut self, counter: u64, elapsed_ticks: u64) -> f64 {
        if elapsed_ticks > 0 {
            let delta = counter.saturating_sub(self.last_counter);
            self.index = (self.index + 1) % RING_DEPTH;
            self.ring[self.index] = delta as f64 / elapsed_ticks as f64;
            self.weighted = self.ring[self.index] * WEIGHT_1
                + self.ring[self.back(1)] * WEIGHT_2
                + self.ring[self.back(2)] * WEIGHT_3;
        }
        self.last_counter = counter;
        self.weighted
    }

    fn back(&self, steps: usize) -> usize {
        (self.index + RING_DEPTH - steps) % RING_DEPTH
    }

    /// Last reported weighted percentage.
    pub fn weighted(&self) -> f64 {
        self.weighted
    }

    /// Counter value seen on the previous call to [`advance`](Self::advance).
    pub fn last_counter(&self) -> u64 {
        self.last_counter
    }

    pub fn index(&self) -> usize {
        self.index
    }
}
