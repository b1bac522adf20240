// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake scheduler for testing

use super::{SchedAdapter, SchedError};
use std::sync::{Arc, Mutex};
use weir_core::{Job, JobId};

/// One recorded scheduler interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedCall {
    Enqueue(JobId),
    Dequeue(JobId),
    Cancel(JobId),
    Recalc,
    Free(JobId),
}

#[derive(Default)]
struct Inner {
    calls: Vec<SchedCall>,
    fail_next: Option<String>,
}

/// Fake scheduler that records calls and manages the job's outstanding
/// flags the way the real scheduler protocol does.
///
/// Tests drive the scheduler's side of the protocol with the completion
/// helpers: [`FakeSched::grant`] before posting an `alloc` event,
/// [`FakeSched::complete_free`] before posting `free`.
#[derive(Clone, Default)]
pub struct FakeSched {
    inner: Arc<Mutex<Inner>>,
}

impl FakeSched {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SchedCall> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).calls.clone()
    }

    /// Make the next fallible call error out
    pub fn fail_next(&self, reason: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fail_next = Some(reason.to_string());
    }

    /// Scheduler grants the queued request; the caller then posts `alloc`
    pub fn grant(&self, job: &mut Job) {
        job.alloc_queued = false;
        job.alloc_pending = false;
    }

    /// Scheduler acknowledges the free request; the caller then posts `free`
    pub fn complete_free(&self, job: &mut Job) {
        job.free_pending = false;
    }

    fn record(&self, call: SchedCall) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .push(call);
    }

    fn take_failure(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fail_next
            .take()
    }
}

impl SchedAdapter for FakeSched {
    fn enqueue_alloc(&self, job: &mut Job) -> Result<(), SchedError> {
        if job.alloc_bypass || job.alloc_queued || job.alloc_pending {
            return Ok(());
        }
        if let Some(reason) = self.take_failure() {
            return Err(SchedError::Unavailable(reason));
        }
        self.record(SchedCall::Enqueue(job.id));
        job.alloc_queued = true;
        Ok(())
    }

    fn dequeue_alloc(&self, job: &mut Job) {
        if job.alloc_queued {
            self.record(SchedCall::Dequeue(job.id));
            job.alloc_queued = false;
        }
    }

    fn cancel_alloc(&self, job: &mut Job) {
        if job.alloc_pending {
            self.record(SchedCall::Cancel(job.id));
        }
    }

    fn recalc_pending(&self) -> Result<(), SchedError> {
        self.record(SchedCall::Recalc);
        Ok(())
    }

    fn send_free(&self, job: &mut Job) -> Result<(), SchedError> {
        if let Some(reason) = self.take_failure() {
            return Err(SchedError::Unavailable(reason));
        }
        self.record(SchedCall::Free(job.id));
        job.free_pending = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
