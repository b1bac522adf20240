// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal adapter
//!
//! Every posted event is handed to the journal before it is applied, along
//! with the eventlog sequence it will occupy (`None` for events that will
//! not be committed). Journal consumers stream the fleet-wide event feed.

mod fake;

pub use fake::FakeJournal;

use thiserror::Error;
use weir_core::{EventEntry, JobId};

/// Errors from journal delivery
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal rejected event: {0}")]
    Rejected(String),
}

/// Adapter for the event journal
pub trait JournalAdapter: Send + Sync {
    /// Deliver one event with the sequence it will be committed at
    fn append(&self, id: JobId, seq: Option<u64>, entry: &EventEntry) -> Result<(), JournalError>;
}
