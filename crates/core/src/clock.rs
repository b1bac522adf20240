// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling
//!
//! Event timestamps are wall-clock seconds since the epoch (the wire form
//! carries them as f64), so unlike a monotonic clock this one can be handed
//! directly to the event codec.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// A clock that provides the current wall time in seconds since the epoch
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> f64;
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<f64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::at(0.0)
    }

    /// Create a fake clock starting at the given timestamp
    pub fn at(timestamp: f64) -> Self {
        Self {
            current: Arc::new(Mutex::new(timestamp)),
        }
    }

    /// Advance the clock by the given number of seconds
    pub fn advance(&self, secs: f64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += secs;
    }

    /// Set the clock to a specific timestamp
    pub fn set(&self, timestamp: f64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = timestamp;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> f64 {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
