// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job states
//!
//! Jobs advance through a fixed DAG:
//! `NEW → DEPEND → PRIORITY → SCHED → (RUN) → CLEANUP → INACTIVE`,
//! with a back-edge SCHED → PRIORITY on restart and forward skips into
//! CLEANUP on fatal exceptions. INACTIVE is terminal.

use serde::{Deserialize, Serialize};

/// Current position of a job in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    New,
    Depend,
    Priority,
    Sched,
    Run,
    Cleanup,
    Inactive,
}

impl JobState {
    /// Lowercase state name, as used in pub payloads and plugin topics
    pub fn name(&self) -> &'static str {
        match self {
            JobState::New => "new",
            JobState::Depend => "depend",
            JobState::Priority => "priority",
            JobState::Sched => "sched",
            JobState::Run => "run",
            JobState::Cleanup => "cleanup",
            JobState::Inactive => "inactive",
        }
    }

    /// Plugin callback topic for this state
    pub fn topic(&self) -> &'static str {
        match self {
            JobState::New => "job.state.new",
            JobState::Depend => "job.state.depend",
            JobState::Priority => "job.state.priority",
            JobState::Sched => "job.state.sched",
            JobState::Run => "job.state.run",
            JobState::Cleanup => "job.state.cleanup",
            JobState::Inactive => "job.state.inactive",
        }
    }

    /// Jobs in RUN or CLEANUP count toward the running set
    pub fn is_running(&self) -> bool {
        matches!(self, JobState::Run | JobState::Cleanup)
    }

    /// INACTIVE is the only terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Inactive)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
