// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event names and context decoding
//!
//! Event names arrive as strings on the wire. `EventKind` maps them onto a
//! closed enum so the state machine dispatches on structure rather than on a
//! string ladder; names outside the protocol fall into `Other` and are
//! logged-and-committed without a state change. The `*_context` helpers
//! decode the typed parameters each event carries.

use crate::entry::EventEntry;
use serde_json::Value;
use thiserror::Error;

/// A required or ill-typed context field was missing or invalid
#[derive(Debug, Error)]
#[error("malformed {event} context: bad or missing '{field}'")]
pub struct ContextError {
    pub event: &'static str,
    pub field: &'static str,
}

/// The closed set of protocol event names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Submit,
    DependencyAdd,
    DependencyRemove,
    SetFlags,
    Memo,
    Depend,
    Priority,
    Urgency,
    Exception,
    Alloc,
    Free,
    Finish,
    Release,
    Clean,
    PrologStart,
    PrologFinish,
    EpilogStart,
    EpilogFinish,
    Restart,
    /// A `dependency-`/`prolog-`/`epilog-` name with an unknown subcommand
    Invalid,
    /// Any other name: committed and cached, no state change
    Other,
}

impl EventKind {
    pub fn parse(name: &str) -> EventKind {
        match name {
            "submit" => EventKind::Submit,
            "set-flags" => EventKind::SetFlags,
            "memo" => EventKind::Memo,
            "depend" => EventKind::Depend,
            "priority" => EventKind::Priority,
            "urgency" => EventKind::Urgency,
            "exception" => EventKind::Exception,
            "alloc" => EventKind::Alloc,
            "free" => EventKind::Free,
            "finish" => EventKind::Finish,
            "release" => EventKind::Release,
            "clean" => EventKind::Clean,
            "flux-restart" => EventKind::Restart,
            name => {
                if let Some(cmd) = name.strip_prefix("dependency-") {
                    match cmd {
                        "add" => EventKind::DependencyAdd,
                        "remove" => EventKind::DependencyRemove,
                        _ => EventKind::Invalid,
                    }
                } else if let Some(cmd) = name.strip_prefix("prolog-") {
                    match cmd {
                        "start" => EventKind::PrologStart,
                        "finish" => EventKind::PrologFinish,
                        _ => EventKind::Invalid,
                    }
                } else if let Some(cmd) = name.strip_prefix("epilog-") {
                    match cmd {
                        "start" => EventKind::EpilogStart,
                        "finish" => EventKind::EpilogFinish,
                        _ => EventKind::Invalid,
                    }
                } else {
                    EventKind::Other
                }
            }
        }
    }
}

/// Parameters of a `submit` event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitContext {
    pub urgency: i32,
    pub userid: u32,
    pub flags: u32,
}

fn field_i64(entry: &EventEntry, event: &'static str, field: &'static str) -> Result<i64, ContextError> {
    entry
        .context_get(field)
        .and_then(Value::as_i64)
        .ok_or(ContextError { event, field })
}

pub fn submit_context(entry: &EventEntry) -> Result<SubmitContext, ContextError> {
    let urgency = urgency_field(entry, "submit")?;
    let userid = field_i64(entry, "submit", "userid")?;
    let flags = field_i64(entry, "submit", "flags")?;
    Ok(SubmitContext {
        urgency,
        userid: u32::try_from(userid).map_err(|_| ContextError {
            event: "submit",
            field: "userid",
        })?,
        flags: u32::try_from(flags).map_err(|_| ContextError {
            event: "submit",
            field: "flags",
        })?,
    })
}

pub fn priority_context(entry: &EventEntry) -> Result<i64, ContextError> {
    field_i64(entry, "priority", "priority")
}

pub fn urgency_context(entry: &EventEntry) -> Result<i32, ContextError> {
    urgency_field(entry, "urgency")
}

/// Urgency is bounded to [0, 31]
fn urgency_field(entry: &EventEntry, event: &'static str) -> Result<i32, ContextError> {
    let urgency = field_i64(entry, event, "urgency")?;
    if !(0..=31).contains(&urgency) {
        return Err(ContextError {
            event,
            field: "urgency",
        });
    }
    Ok(urgency as i32)
}

pub fn exception_severity(entry: &EventEntry) -> Result<i32, ContextError> {
    let severity = field_i64(entry, "exception", "severity")?;
    i32::try_from(severity).map_err(|_| ContextError {
        event: "exception",
        field: "severity",
    })
}

pub fn release_final(entry: &EventEntry) -> Result<bool, ContextError> {
    entry
        .context_get("final")
        .and_then(Value::as_bool)
        .ok_or(ContextError {
            event: "release",
            field: "final",
        })
}

pub fn dependency_description(entry: &EventEntry) -> Result<&str, ContextError> {
    entry
        .context_get("description")
        .and_then(Value::as_str)
        .ok_or(ContextError {
            event: "dependency",
            field: "description",
        })
}

pub fn flag_names(entry: &EventEntry) -> Result<Vec<&str>, ContextError> {
    let err = ContextError {
        event: "set-flags",
        field: "flags",
    };
    let names = entry
        .context_get("flags")
        .and_then(Value::as_array)
        .ok_or(err)?;
    names
        .iter()
        .map(|v| {
            v.as_str().ok_or(ContextError {
                event: "set-flags",
                field: "flags",
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
