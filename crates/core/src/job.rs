// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job record
//!
//! A thin record with the mutable state, flags, and counters the state
//! machine guards read. Jobs are created by the ingest pipeline in NEW
//! state and handed to the engine; the engine owns them through the active
//! index until they reach INACTIVE.

use crate::entry::EventEntry;
use crate::id::JobId;
use crate::state::JobState;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Jobs in the active index are shared between the engine, in-flight
/// post pipelines, and plugin callbacks.
pub type SharedJob = Arc<Mutex<Job>>;

/// Errors from job record helpers
#[derive(Debug, Error)]
pub enum JobError {
    #[error("dependency already exists: {0}")]
    DuplicateDependency(String),
    #[error("no such dependency: {0}")]
    UnknownDependency(String),
    #[error("unknown job flag: {0}")]
    UnknownFlag(String),
    #[error("too many active prolog/epilog scripts")]
    PerilogOverflow,
}

/// Named job flags, stored as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobFlags(u32);

impl JobFlags {
    pub const DEBUG: u32 = 1;
    pub const WAITABLE: u32 = 2;
    pub const NOVALIDATE: u32 = 4;

    const NAMES: &'static [(&'static str, u32)] = &[
        ("debug", Self::DEBUG),
        ("waitable", Self::WAITABLE),
        ("novalidate", Self::NOVALIDATE),
    ];

    pub fn from_bits(bits: u32) -> Self {
        JobFlags(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    /// Union another flags word into this one
    pub fn union(&mut self, bits: u32) {
        self.0 |= bits;
    }

    /// Set a flag by its protocol name
    pub fn set_by_name(&mut self, name: &str) -> Result<(), JobError> {
        for (flag_name, bit) in Self::NAMES {
            if *flag_name == name {
                self.0 |= bit;
                return Ok(());
            }
        }
        Err(JobError::UnknownFlag(name.to_string()))
    }
}

/// Authoritative in-memory record of one job
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    /// Wall-clock time of the submit event
    pub t_submit: f64,
    /// Scheduling urgency in [0, 31]
    pub urgency: i32,
    /// Priority assigned by the scheduler plugin; unset until the first
    /// priority event
    pub priority: Option<i64>,
    pub userid: u32,
    pub flags: JobFlags,

    /// Resources are held between alloc and free
    pub has_resources: bool,
    /// Outstanding collaborator interactions; set and cleared by the
    /// scheduler/exec adapters, read by action guards
    pub alloc_queued: bool,
    pub alloc_pending: bool,
    pub free_pending: bool,
    pub start_pending: bool,
    pub alloc_bypass: bool,
    /// Number of in-flight prolog and epilog scripts
    pub perilog_active: u8,

    /// Latch so the depend event is posted at most once
    pub depend_posted: bool,
    /// First terminal event (fatal exception or finish); never overwritten
    pub end_event: Option<EventEntry>,
    /// Count of committed events in this job's eventlog
    pub eventlog_seq: u64,

    dependencies: HashSet<String>,
    /// User annotations accumulated from memo events
    pub annotations: Option<Map<String, Value>>,
    /// Event-index id -> sequence of the last occurrence (None for
    /// uncommitted events)
    event_ids: HashMap<i32, Option<u64>>,
}

impl Job {
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            state: JobState::New,
            t_submit: 0.0,
            urgency: 16,
            priority: None,
            userid: 0,
            flags: JobFlags::default(),
            has_resources: false,
            alloc_queued: false,
            alloc_pending: false,
            free_pending: false,
            start_pending: false,
            alloc_bypass: false,
            perilog_active: 0,
            depend_posted: false,
            end_event: None,
            eventlog_seq: 0,
            dependencies: HashSet::new(),
            annotations: None,
            event_ids: HashMap::new(),
        }
    }

    /// Register an outstanding dependency by description
    pub fn dependency_add(&mut self, description: &str) -> Result<(), JobError> {
        if !self.dependencies.insert(description.to_string()) {
            return Err(JobError::DuplicateDependency(description.to_string()));
        }
        Ok(())
    }

    /// Discharge a previously added dependency
    pub fn dependency_remove(&mut self, description: &str) -> Result<(), JobError> {
        if !self.dependencies.remove(description) {
            return Err(JobError::UnknownDependency(description.to_string()));
        }
        Ok(())
    }

    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }

    pub fn set_flag(&mut self, name: &str) -> Result<(), JobError> {
        self.flags.set_by_name(name)
    }

    pub fn perilog_start(&mut self) -> Result<(), JobError> {
        self.perilog_active = self
            .perilog_active
            .checked_add(1)
            .ok_or(JobError::PerilogOverflow)?;
        Ok(())
    }

    pub fn perilog_finish(&mut self) {
        self.perilog_active = self.perilog_active.saturating_sub(1);
    }

    /// Record that an event with the given index id was observed, and the
    /// sequence it was committed at (None for uncommitted events)
    pub fn event_id_set(&mut self, id: i32, seq: Option<u64>) {
        self.event_ids.insert(id, seq);
    }

    /// Whether an event with the given index id has ever been posted;
    /// the inner value is the sequence of its last committed occurrence
    pub fn event_id_seen(&self, id: i32) -> Option<Option<u64>> {
        self.event_ids.get(&id).copied()
    }

    /// Merge an annotation update under `key`. Null values delete, nested
    /// objects merge recursively, and empty objects are pruned.
    pub fn annotations_update(&mut self, key: &str, updates: &Map<String, Value>) {
        let mut root = self.annotations.take().unwrap_or_default();
        {
            let slot = root
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(target) = slot {
                merge_annotations(target, updates);
            }
        }
        if root
            .get(key)
            .and_then(Value::as_object)
            .is_some_and(Map::is_empty)
        {
            root.remove(key);
        }
        self.annotations = if root.is_empty() { None } else { Some(root) };
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }
}

fn merge_annotations(target: &mut Map<String, Value>, updates: &Map<String, Value>) {
    for (key, value) in updates {
        match value {
            Value::Null => {
                target.remove(key);
            }
            Value::Object(nested) => {
                let slot = target
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(dst) = slot {
                    merge_annotations(dst, nested);
                    if dst.is_empty() {
                        target.remove(key);
                    }
                }
            }
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
