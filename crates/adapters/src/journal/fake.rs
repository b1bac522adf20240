// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake journal for testing

use super::{JournalAdapter, JournalError};
use std::sync::{Arc, Mutex};
use weir_core::{EventEntry, JobId};

/// One journaled event
#[derive(Debug, Clone)]
pub struct JournalRecord {
    pub id: JobId,
    pub seq: Option<u64>,
    pub name: String,
}

#[derive(Default)]
struct Inner {
    records: Vec<JournalRecord>,
    fail_next: Option<String>,
}

/// Fake journal that records delivered events
#[derive(Clone, Default)]
pub struct FakeJournal {
    inner: Arc<Mutex<Inner>>,
}

impl FakeJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<JournalRecord> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .records
            .clone()
    }

    pub fn fail_next(&self, reason: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fail_next = Some(reason.to_string());
    }
}

impl JournalAdapter for FakeJournal {
    fn append(&self, id: JobId, seq: Option<u64>, entry: &EventEntry) -> Result<(), JournalError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(reason) = inner.fail_next.take() {
            return Err(JournalError::Rejected(reason));
        }
        inner.records.push(JournalRecord {
            id,
            seq,
            name: entry.name.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
