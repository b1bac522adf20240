// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler adapter
//!
//! The engine asks the scheduler for resources (alloc) and returns them
//! (free). The adapter owns the outstanding-interaction flags on the job
//! (`alloc_queued`, `alloc_pending`, `free_pending`): it sets them when a
//! request goes out and clears them when the scheduler answers, which is
//! what makes the engine's per-state actions idempotent.

mod fake;

pub use fake::{FakeSched, SchedCall};

use thiserror::Error;
use weir_core::Job;

/// Errors from scheduler interactions
#[derive(Debug, Error)]
pub enum SchedError {
    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Adapter for the alloc/free protocol with the scheduler
pub trait SchedAdapter: Send + Sync {
    /// Queue an alloc request for the job; no-op if one is already
    /// queued, pending, or bypassed
    fn enqueue_alloc(&self, job: &mut Job) -> Result<(), SchedError>;

    /// Drop a queued (not yet sent) alloc request
    fn dequeue_alloc(&self, job: &mut Job);

    /// Cancel an alloc request already sent to the scheduler
    fn cancel_alloc(&self, job: &mut Job);

    /// Re-evaluate how many queued requests should be put in flight
    fn recalc_pending(&self) -> Result<(), SchedError>;

    /// Ask the scheduler to take the job's resources back
    fn send_free(&self, job: &mut Job) -> Result<(), SchedError>;
}
