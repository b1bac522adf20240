// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake exec subsystem for testing

use super::{ExecAdapter, ExecError};
use std::sync::{Arc, Mutex};
use weir_core::{Job, JobId};

#[derive(Default)]
struct Inner {
    starts: Vec<JobId>,
    fail_next: Option<String>,
}

/// Fake exec adapter that records start requests
#[derive(Clone, Default)]
pub struct FakeExec {
    inner: Arc<Mutex<Inner>>,
}

impl FakeExec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs a start request was sent for, in order
    pub fn starts(&self) -> Vec<JobId> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).starts.clone()
    }

    pub fn fail_next(&self, reason: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fail_next = Some(reason.to_string());
    }

    /// Exec sends its final release; the caller then posts `finish`/`free`
    pub fn release(&self, job: &mut Job) {
        job.start_pending = false;
    }
}

impl ExecAdapter for FakeExec {
    fn send_start(&self, job: &mut Job) -> Result<(), ExecError> {
        if job.start_pending {
            return Ok(());
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(reason) = inner.fail_next.take() {
            return Err(ExecError::Unavailable(reason));
        }
        inner.starts.push(job.id);
        job.start_pending = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
