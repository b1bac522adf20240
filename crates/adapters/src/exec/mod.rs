// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exec (shell launch) adapter
//!
//! Once a job holds resources and any prolog has finished, the engine asks
//! the exec subsystem to start the job shells. `start_pending` stays set on
//! the job until the exec side has sent its final release.

mod fake;

pub use fake::FakeExec;

use thiserror::Error;
use weir_core::Job;

/// Errors from exec interactions
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("exec unavailable: {0}")]
    Unavailable(String),
}

/// Adapter for the start protocol with the exec subsystem
pub trait ExecAdapter: Send + Sync {
    /// Send the start request; no-op if one is already outstanding
    fn send_start(&self, job: &mut Job) -> Result<(), ExecError>;
}
