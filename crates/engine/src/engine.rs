// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job-manager engine
//!
//! `post_event` drives everything: it runs the event through the journal,
//! the state machine, the eventlog batch, the plugin hooks, and the
//! per-state action, in that order. Hooks and actions may post further
//! events, which recurse through the same pipeline; every post holds its
//! own reference to the job for the duration of the call, so a nested
//! transition to INACTIVE (which drops the job from the active index) can
//! never free a job out from under an outer frame.

use crate::batch::BatchEngine;
use crate::error::{EventError, Fatal};
use crate::plugin::{JobPlugin, PostSink};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use weir_adapters::{
    ExecAdapter, JournalAdapter, KvsClient, LifecycleAdapter, PubBus, SchedAdapter,
};
use weir_core::{
    update, Clock, EventEntry, EventIndex, Job, JobFlags, JobId, JobState, SharedJob,
};

/// Flags recognized by `post_event`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFlags {
    /// Do not append the event to the KVS and do not advance the sequence
    pub no_commit: bool,
    /// Consume a sequence number even with `no_commit` (the event is
    /// already in the eventlog, e.g. a submit event replayed by ingest)
    pub force_sequence: bool,
}

impl PostFlags {
    pub const NO_COMMIT: PostFlags = PostFlags {
        no_commit: true,
        force_sequence: false,
    };
}

/// Engine tuning knobs. File-based configuration is the host's concern;
/// this is handed in ready-made.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a batch accumulates before committing
    pub batch_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_window: Duration::from_millis(10),
        }
    }
}

/// External collaborators the engine is wired to
pub struct EngineDeps<K, B> {
    pub kvs: K,
    pub bus: B,
    pub sched: Arc<dyn SchedAdapter>,
    pub exec: Arc<dyn ExecAdapter>,
    pub journal: Arc<dyn JournalAdapter>,
    pub lifecycle: Arc<dyn LifecycleAdapter>,
}

/// The job-manager event engine
pub struct Engine<K, B, C>
where
    K: KvsClient,
    B: PubBus,
    C: Clock,
{
    batch: BatchEngine<K, B>,
    clock: C,
    sched: Arc<dyn SchedAdapter>,
    exec: Arc<dyn ExecAdapter>,
    journal: Arc<dyn JournalAdapter>,
    lifecycle: Arc<dyn LifecycleAdapter>,
    jobs: Mutex<HashMap<JobId, SharedJob>>,
    evindex: Mutex<EventIndex>,
    plugins: Mutex<Vec<Arc<dyn JobPlugin>>>,
    running: AtomicUsize,
}

impl<K, B, C> Engine<K, B, C>
where
    K: KvsClient,
    B: PubBus,
    C: Clock,
{
    /// Create an engine. The returned receiver delivers fatal conditions
    /// (commit or publish failure); the host reactor must stop with error
    /// when one arrives.
    pub fn new(
        deps: EngineDeps<K, B>,
        config: EngineConfig,
        clock: C,
    ) -> (Self, mpsc::UnboundedReceiver<Fatal>) {
        let (fatal_tx, fatal_rx) = mpsc::unbounded_channel();
        let engine = Self {
            batch: BatchEngine::new(deps.kvs, deps.bus, config.batch_window, fatal_tx),
            clock,
            sched: deps.sched,
            exec: deps.exec,
            journal: deps.journal,
            lifecycle: deps.lifecycle,
            jobs: Mutex::new(HashMap::new()),
            evindex: Mutex::new(EventIndex::new()),
            plugins: Mutex::new(Vec::new()),
            running: AtomicUsize::new(0),
        };
        (engine, fatal_rx)
    }

    /// Adopt a job into the active index
    pub fn insert_job(&self, job: Job) -> SharedJob {
        let id = job.id;
        if job.state.is_running() {
            self.running.fetch_add(1, Ordering::Relaxed);
        }
        let shared = Arc::new(Mutex::new(job));
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::clone(&shared));
        shared
    }

    /// Look up an active job
    pub fn job(&self, id: JobId) -> Option<SharedJob> {
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }

    /// Number of jobs in the active index
    pub fn active_count(&self) -> usize {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Number of jobs in RUN or CLEANUP
    pub fn running_count(&self) -> usize {
        self.running.load(Ordering::Relaxed)
    }

    pub fn register_plugin(&self, plugin: Arc<dyn JobPlugin>) {
        self.plugins
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(plugin);
    }

    /// Register a reply deferred until the current batch commits. The
    /// receiver resolves after a successful commit and errors (channel
    /// closed) if the commit fails.
    pub fn respond_on_commit(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.batch.respond_on_commit(tx);
        rx
    }

    /// Post an event by name, stamping it with the current wall time
    pub fn post_event(
        &self,
        job: &SharedJob,
        name: &str,
        flags: PostFlags,
        context: Option<Value>,
    ) -> Result<(), EventError> {
        {
            let guard = job.lock().unwrap_or_else(|e| e.into_inner());
            if guard.state == JobState::New && name != "submit" {
                return Err(EventError::TryAgain);
            }
        }
        let entry = EventEntry::new(self.clock.now(), name, context)?;
        self.post_entry(job, entry, flags)
    }

    /// Post a pre-built entry (e.g. a submit event carrying the ingest
    /// timestamp)
    pub fn post_entry(
        &self,
        job: &SharedJob,
        entry: EventEntry,
        flags: PostFlags,
    ) -> Result<(), EventError> {
        // Hold our own reference across the pipeline; a nested post may
        // retire the job and drop the active index's reference.
        let job = Arc::clone(job);

        let (prev, snapshot) = {
            let mut guard = job.lock().unwrap_or_else(|e| e.into_inner());

            if guard.state == JobState::New && entry.name != "submit" {
                return Err(EventError::TryAgain);
            }

            // Journal consumers see the sequence the event will occupy;
            // None when the event will not be committed.
            let seq = if flags.no_commit && !flags.force_sequence {
                None
            } else {
                Some(guard.eventlog_seq)
            };
            self.journal.append(guard.id, seq, &entry)?;

            let prev = update::apply(&mut guard, &entry)?;
            if seq.is_some() {
                guard.eventlog_seq += 1;
            }

            let event_id = self
                .evindex
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .index(&entry.name)?;
            guard.event_id_set(event_id, seq);

            if !flags.no_commit {
                self.batch.append(guard.id, &entry)?;
            }

            if guard.state != prev {
                self.batch.pub_state(guard.id, guard.state, entry.timestamp);
                tracing::debug!(
                    job = %guard.id,
                    topic = guard.state.topic(),
                    from = %prev,
                    "state transition"
                );
            }

            if guard.state.is_running() && !prev.is_running() {
                self.running.fetch_add(1, Ordering::Relaxed);
            } else if !guard.state.is_running() && prev.is_running() {
                self.running.fetch_sub(1, Ordering::Relaxed);
            }

            (prev, guard.clone())
        };

        self.call_plugins(&snapshot, &entry, prev);
        self.run_action(&job)
    }

    /// Flush pending batches and wait for in-flight commits and publishes
    pub async fn shutdown(&self) {
        self.batch.shutdown().await;
    }

    /// Plugin hook dispatch: all subscribers see every event; state
    /// changes get the state-topic callback; urgency events trigger a
    /// reprioritization round. Callbacks get a snapshot, never the live
    /// record, and post follow-up events through the sink.
    fn call_plugins(&self, snapshot: &Job, entry: &EventEntry, prev: JobState) {
        let plugins: Vec<Arc<dyn JobPlugin>> = self
            .plugins
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if plugins.is_empty() {
            return;
        }

        let mut sink = PostSink::new();
        for plugin in &plugins {
            if let Err(err) = plugin.on_event(snapshot, entry, &mut sink) {
                // TODO: raise a job exception here instead of dropping the error
                tracing::warn!(job = %snapshot.id, event = %entry.name, error = %err,
                    "plugin event callback failed");
            }
        }

        if snapshot.state != prev {
            for plugin in &plugins {
                if let Err(err) = plugin.on_state_change(snapshot, entry, prev, &mut sink) {
                    tracing::warn!(job = %snapshot.id, topic = snapshot.state.topic(),
                        error = %err, "plugin state callback failed");
                }
            }
        } else if entry.name == "urgency" {
            let new_priority = plugins.iter().find_map(|p| p.priority(snapshot));
            if let Some(priority) = new_priority {
                let reorderable =
                    matches!(snapshot.state, JobState::Priority | JobState::Sched);
                if reorderable && snapshot.priority != Some(priority) {
                    sink.post(
                        snapshot.id,
                        "priority",
                        Some(json!({ "priority": priority })),
                    );
                }
            }
        }

        for request in sink.into_posts() {
            let Some(job) = self.job(request.id) else {
                tracing::warn!(job = %request.id, event = %request.name,
                    "dropping plugin post for retired job");
                continue;
            };
            // Plugin post failures follow the same policy as callback errors
            if let Err(err) = self.post_event(&job, &request.name, request.flags, request.context)
            {
                tracing::warn!(job = %request.id, event = %request.name, error = %err,
                    "plugin-posted event rejected");
            }
        }
    }

    /// Per-state action, run after every event. Idempotent: every effect
    /// is guarded by job flags, so re-running it with no intervening event
    /// changes nothing.
    fn run_action(&self, shared: &SharedJob) -> Result<(), EventError> {
        let mut job = shared.lock().unwrap_or_else(|e| e.into_inner());
        match job.state {
            JobState::New => {}
            JobState::Depend => {
                // Post depend once all dependency references are gone
                if job.dependency_count() == 0 && !job.depend_posted {
                    job.depend_posted = true;
                    drop(job);
                    self.post_event(shared, "depend", PostFlags::default(), None)?;
                }
            }
            JobState::Priority => {
                // Re-entered from SCHED: drop any stale alloc request
                self.sched.dequeue_alloc(&mut job);
            }
            JobState::Sched => {
                self.sched.enqueue_alloc(&mut job)?;
                self.sched.recalc_pending()?;
            }
            JobState::Run => {
                // Hold the start request while a prolog is still running
                if job.perilog_active == 0 {
                    self.exec.send_start(&mut job)?;
                }
            }
            JobState::Cleanup => {
                if job.alloc_pending {
                    self.sched.cancel_alloc(&mut job);
                }
                if job.alloc_queued {
                    self.sched.dequeue_alloc(&mut job);
                }

                // start_pending clears when the exec side sends its final
                // release; only then is it safe to return resources.
                if job.has_resources
                    && job.perilog_active == 0
                    && !job.alloc_bypass
                    && !job.start_pending
                    && !job.free_pending
                {
                    self.sched.send_free(&mut job)?;
                }

                if !job.alloc_queued
                    && !job.alloc_pending
                    && !job.free_pending
                    && !job.start_pending
                    && !job.has_resources
                {
                    drop(job);
                    self.post_event(shared, "clean", PostFlags::default(), None)?;
                }
            }
            JobState::Inactive => {
                if job.flags.contains(JobFlags::WAITABLE) {
                    self.lifecycle.notify_inactive(&job);
                }
                let id = job.id;
                drop(job);
                self.jobs
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&id);
                self.lifecycle.job_removed(id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
