// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state machine
//!
//! `apply` maps one event onto a job, mutating state, flags, and counters
//! per the transition protocol. It is pure bookkeeping: no I/O, no
//! collaborator calls, no event posting. Illegal transitions are rejected
//! and leave the job unchanged observable-state-wise.

use crate::entry::EventEntry;
use crate::event::{self, ContextError, EventKind};
use crate::job::{Job, JobError};
use crate::state::JobState;
use thiserror::Error;

/// Errors from applying an event to a job
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("invalid '{name}' event in {state} state")]
    InvalidTransition { name: String, state: JobState },
    #[error("{0}")]
    Malformed(String),
    #[error("{0}")]
    Exhausted(String),
}

impl From<ContextError> for UpdateError {
    fn from(err: ContextError) -> Self {
        UpdateError::Malformed(err.to_string())
    }
}

impl From<JobError> for UpdateError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::PerilogOverflow => UpdateError::Exhausted(err.to_string()),
            _ => UpdateError::Malformed(err.to_string()),
        }
    }
}

fn invalid(job: &Job, entry: &EventEntry) -> UpdateError {
    UpdateError::InvalidTransition {
        name: entry.name.clone(),
        state: job.state,
    }
}

/// Apply one event to the job, returning the previous state.
///
/// The caller decides what to do about a state change (publish, action
/// dispatch); this function only performs the transition.
pub fn apply(job: &mut Job, entry: &EventEntry) -> Result<JobState, UpdateError> {
    let prev = job.state;

    match EventKind::parse(&entry.name) {
        EventKind::Submit => {
            if job.state != JobState::New {
                return Err(invalid(job, entry));
            }
            let ctx = event::submit_context(entry)?;
            job.t_submit = entry.timestamp;
            job.urgency = ctx.urgency;
            job.userid = ctx.userid;
            job.flags.union(ctx.flags);
            job.state = JobState::Depend;
        }
        EventKind::DependencyAdd => {
            if job.state != JobState::Depend {
                return Err(invalid(job, entry));
            }
            let description = event::dependency_description(entry)?;
            job.dependency_add(description)?;
        }
        EventKind::DependencyRemove => {
            if job.state != JobState::Depend {
                return Err(invalid(job, entry));
            }
            let description = event::dependency_description(entry)?;
            job.dependency_remove(description)?;
        }
        EventKind::SetFlags => {
            for name in event::flag_names(entry)? {
                job.set_flag(name)?;
            }
        }
        EventKind::Memo => {
            let updates = entry
                .context
                .as_ref()
                .ok_or_else(|| UpdateError::Malformed("memo without context".to_string()))?;
            job.annotations_update("user", updates);
        }
        EventKind::Depend => {
            if job.state != JobState::Depend {
                return Err(invalid(job, entry));
            }
            job.state = JobState::Priority;
        }
        EventKind::Priority => {
            if job.state != JobState::Priority && job.state != JobState::Sched {
                return Err(invalid(job, entry));
            }
            job.priority = Some(event::priority_context(entry)?);
            job.state = JobState::Sched;
        }
        EventKind::Urgency => {
            if job.state.is_terminal() {
                return Err(invalid(job, entry));
            }
            job.urgency = event::urgency_context(entry)?;
        }
        EventKind::Exception => {
            if job.state == JobState::New || job.state == JobState::Inactive {
                return Err(invalid(job, entry));
            }
            let severity = event::exception_severity(entry)?;
            if severity == 0 {
                if job.end_event.is_none() {
                    job.end_event = Some(entry.clone());
                }
                job.state = JobState::Cleanup;
            }
        }
        EventKind::Alloc => {
            if job.state != JobState::Sched && job.state != JobState::Cleanup {
                return Err(invalid(job, entry));
            }
            job.has_resources = true;
            if job.state == JobState::Sched {
                job.state = JobState::Run;
            }
        }
        EventKind::Free => {
            if job.state != JobState::Cleanup || !job.has_resources {
                return Err(invalid(job, entry));
            }
            job.has_resources = false;
        }
        EventKind::Finish => {
            if job.state != JobState::Run && job.state != JobState::Cleanup {
                return Err(invalid(job, entry));
            }
            if job.state == JobState::Run {
                if job.end_event.is_none() {
                    job.end_event = Some(entry.clone());
                }
                job.state = JobState::Cleanup;
            }
        }
        EventKind::Release => {
            if job.state != JobState::Run && job.state != JobState::Cleanup {
                return Err(invalid(job, entry));
            }
            let final_release = event::release_final(entry)?;
            if final_release && job.state == JobState::Run {
                return Err(invalid(job, entry));
            }
        }
        EventKind::Clean => {
            if job.state != JobState::Cleanup {
                return Err(invalid(job, entry));
            }
            job.state = JobState::Inactive;
        }
        EventKind::PrologStart => {
            if job.start_pending {
                return Err(invalid(job, entry));
            }
            job.perilog_start()?;
        }
        EventKind::PrologFinish => {
            if job.start_pending {
                return Err(invalid(job, entry));
            }
            job.perilog_finish();
        }
        EventKind::EpilogStart => {
            if job.state != JobState::Cleanup {
                return Err(invalid(job, entry));
            }
            job.perilog_start()?;
        }
        EventKind::EpilogFinish => {
            if job.state != JobState::Cleanup {
                return Err(invalid(job, entry));
            }
            job.perilog_finish();
        }
        EventKind::Restart => {
            // Only defined for jobs waiting in SCHED; elsewhere the event
            // is recorded without a transition.
            if job.state == JobState::Sched {
                job.state = JobState::Priority;
            }
        }
        EventKind::Invalid => {
            return Err(UpdateError::Malformed(format!(
                "unknown event subcommand: {}",
                entry.name
            )));
        }
        EventKind::Other => {}
    }

    Ok(prev)
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
