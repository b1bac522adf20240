// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the event engine

use thiserror::Error;
use weir_adapters::{ExecError, JournalError, KvsError, PubError, SchedError};
use weir_core::{CodecError, IndexError, JobState, UpdateError};

/// Errors returned to callers of `post_event`
#[derive(Debug, Error)]
pub enum EventError {
    /// The state machine rejected the event for the job's current state
    #[error("invalid '{name}' event in {state} state")]
    InvalidTransition { name: String, state: JobState },
    /// The event or its context could not be decoded
    #[error("malformed event: {0}")]
    Malformed(String),
    /// The job is still NEW; retry after submit
    #[error("job not yet submitted")]
    TryAgain,
    #[error("resources exhausted: {0}")]
    ResourceExhausted(String),
    /// A scheduler/exec/journal action failed
    #[error("{0}")]
    Downstream(String),
}

impl From<UpdateError> for EventError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::InvalidTransition { name, state } => {
                EventError::InvalidTransition { name, state }
            }
            UpdateError::Malformed(reason) => EventError::Malformed(reason),
            UpdateError::Exhausted(reason) => EventError::ResourceExhausted(reason),
        }
    }
}

impl From<CodecError> for EventError {
    fn from(err: CodecError) -> Self {
        EventError::Malformed(err.to_string())
    }
}

impl From<IndexError> for EventError {
    fn from(err: IndexError) -> Self {
        EventError::ResourceExhausted(err.to_string())
    }
}

impl From<SchedError> for EventError {
    fn from(err: SchedError) -> Self {
        EventError::Downstream(err.to_string())
    }
}

impl From<ExecError> for EventError {
    fn from(err: ExecError) -> Self {
        EventError::Downstream(err.to_string())
    }
}

impl From<JournalError> for EventError {
    fn from(err: JournalError) -> Self {
        EventError::Downstream(err.to_string())
    }
}

/// Conditions the engine cannot recover from.
///
/// The KVS and the pub bus are the durability and notification contract of
/// the whole job manager; once either breaks, continuing would let
/// observers diverge from the source of truth. The host reactor receives
/// these over the fatal channel and must stop with error.
#[derive(Debug, Clone, Error)]
pub enum Fatal {
    #[error("eventlog commit failed: {0}")]
    CommitFailed(String),
    #[error("job-state publish failed: {0}")]
    PubFailed(String),
}

impl From<KvsError> for Fatal {
    fn from(err: KvsError) -> Self {
        Fatal::CommitFailed(err.to_string())
    }
}

impl From<PubError> for Fatal {
    fn from(err: PubError) -> Self {
        Fatal::PubFailed(err.to_string())
    }
}
