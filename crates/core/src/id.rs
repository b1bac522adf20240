// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifiers and their KVS addressing

use serde::{Deserialize, Serialize};

/// Opaque 64-bit job identity, assigned by the ingest pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// Well-known key of this job's append-only event log in the KVS
    pub fn eventlog_key(&self) -> String {
        format!("jobs/{}/eventlog", self.0)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        JobId(id)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
