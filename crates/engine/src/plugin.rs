// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin hook points
//!
//! Plugins observe every event, get a dedicated callback on state changes,
//! and may be asked for a job's priority. Callbacks receive a snapshot of
//! the job and a [`PostSink`]: posts made through the sink are applied
//! once the callbacks return, with the engine holding its own reference
//! to the job, so a callback can never observe the job freed out from
//! under it.

use crate::engine::PostFlags;
use serde_json::Value;
use thiserror::Error;
use weir_core::{EventEntry, Job, JobId, JobState};

/// Errors from plugin callbacks
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PluginError(pub String);

/// An event post requested by a plugin callback
#[derive(Debug, Clone)]
pub struct PostRequest {
    pub id: JobId,
    pub name: String,
    pub flags: PostFlags,
    pub context: Option<Value>,
}

/// Collects event posts made from inside a plugin callback
#[derive(Debug, Default)]
pub struct PostSink {
    posts: Vec<PostRequest>,
}

impl PostSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Post an event to a job once the current pipeline completes
    pub fn post(&mut self, id: JobId, name: impl Into<String>, context: Option<Value>) {
        self.post_with_flags(id, name, PostFlags::default(), context);
    }

    pub fn post_with_flags(
        &mut self,
        id: JobId,
        name: impl Into<String>,
        flags: PostFlags,
        context: Option<Value>,
    ) {
        self.posts.push(PostRequest {
            id,
            name: name.into(),
            flags,
            context,
        });
    }

    pub(crate) fn into_posts(self) -> Vec<PostRequest> {
        self.posts
    }
}

/// Hook interface for job-manager plugins
pub trait JobPlugin: Send + Sync {
    /// Called for every posted event
    fn on_event(
        &self,
        _job: &Job,
        _entry: &EventEntry,
        _posts: &mut PostSink,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called when an event changed the job's state
    fn on_state_change(
        &self,
        _job: &Job,
        _entry: &EventEntry,
        _prev: JobState,
        _posts: &mut PostSink,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    /// Current priority for the job, if this plugin assigns one
    fn priority(&self, _job: &Job) -> Option<i64> {
        None
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
