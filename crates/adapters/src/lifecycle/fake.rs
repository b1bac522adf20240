// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake lifecycle listener for testing

use super::LifecycleAdapter;
use std::sync::{Arc, Mutex};
use weir_core::{Job, JobId};

#[derive(Default)]
struct Inner {
    notified: Vec<JobId>,
    removed: Vec<JobId>,
}

/// Fake lifecycle listener that records notifications
#[derive(Clone, Default)]
pub struct FakeLifecycle {
    inner: Arc<Mutex<Inner>>,
}

impl FakeLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// WAITABLE jobs that went inactive
    pub fn notified(&self) -> Vec<JobId> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .notified
            .clone()
    }

    /// Jobs removed from the active index
    pub fn removed(&self) -> Vec<JobId> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .removed
            .clone()
    }
}

impl LifecycleAdapter for FakeLifecycle {
    fn notify_inactive(&self, job: &Job) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .notified
            .push(job.id);
    }

    fn job_removed(&self, id: JobId) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .removed
            .push(id);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
