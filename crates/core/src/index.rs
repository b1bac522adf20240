// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event name index
//!
//! Assigns a dense integer id (>= 1) to each distinct event name seen.
//! Other subsystems use the ids to record "has this job ever seen event X"
//! without storing the name per job. Ids are stable for the process
//! lifetime.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("event index exhausted")]
    Exhausted,
}

/// Insertion-ordered mapping of event name to dense id
#[derive(Debug, Default)]
pub struct EventIndex {
    ids: HashMap<String, i32>,
}

impl EventIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, allocating the next id on first sight
    pub fn index(&mut self, name: &str) -> Result<i32, IndexError> {
        if let Some(id) = self.ids.get(name) {
            return Ok(*id);
        }
        let next = i32::try_from(self.ids.len() + 1).map_err(|_| IndexError::Exhausted)?;
        self.ids.insert(name.to_string(), next);
        Ok(next)
    }

    /// Id for `name` if it has been seen
    pub fn lookup(&self, name: &str) -> Option<i32> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
