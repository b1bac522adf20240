// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event-log entry codec
//!
//! Entries travel and persist as one line of UTF-8 JSON with a trailing
//! newline: `{"timestamp":<f64>,"name":"<str>","context":{...}}`. The
//! `context` object is optional; `timestamp` and `name` are mandatory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from encoding or parsing event entries
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event timestamp must be a nonnegative number")]
    BadTimestamp,
    #[error("event name must be nonempty ASCII")]
    BadName,
    #[error("event context must be an object")]
    BadContext,
}

/// One record of a job's event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    /// Wall-clock seconds since the epoch
    pub timestamp: f64,
    /// Event name, e.g. `submit` or `alloc`
    pub name: String,
    /// Named event parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl EventEntry {
    /// Build a validated entry
    pub fn new(
        timestamp: f64,
        name: impl Into<String>,
        context: Option<Value>,
    ) -> Result<Self, CodecError> {
        let context = match context {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => return Err(CodecError::BadContext),
        };
        let entry = Self {
            timestamp,
            name: name.into(),
            context,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Serialize to the wire form (single line, trailing newline)
    pub fn encode(&self) -> Result<String, CodecError> {
        self.validate()?;
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Parse one line of the wire form; a trailing newline is accepted
    pub fn parse(line: &str) -> Result<Self, CodecError> {
        let entry: EventEntry = serde_json::from_str(line.trim_end_matches('\n'))?;
        entry.validate()?;
        Ok(entry)
    }

    /// Look up a context field by name
    pub fn context_get(&self, key: &str) -> Option<&Value> {
        self.context.as_ref().and_then(|c| c.get(key))
    }

    fn validate(&self) -> Result<(), CodecError> {
        if !self.timestamp.is_finite() || self.timestamp < 0.0 {
            return Err(CodecError::BadTimestamp);
        }
        if self.name.is_empty() || !self.name.is_ascii() {
            return Err(CodecError::BadName);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
