// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Eventlog commit batching
//!
//! KVS round-trips are amortized by collecting appends, state-transition
//! notifications, and deferred replies for a short window (10 ms by
//! default), then committing all appends in one transaction. Notifications
//! and replies only go out after the commit resolves, so anyone who
//! receives a `job-state` transition can immediately read the matching
//! event from the KVS.
//!
//! Batch lifecycle: Idle -> Accumulating (first append arms the one-shot
//! window timer) -> Committing (timer fires or shutdown) -> Done/Failed.
//! A new batch may start accumulating while earlier ones are still
//! committing. A commit or publish failure is fatal to the engine: it is
//! reported on the fatal channel and the batch's replies are dropped.

use crate::error::{EventError, Fatal};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use weir_adapters::{KvsClient, KvsTxn, PubBus};
use weir_core::{EventEntry, JobId, JobState};

/// One pending state-transition notification
#[derive(Debug, Clone)]
struct Transition {
    id: JobId,
    state: JobState,
    timestamp: f64,
}

/// Work accumulated during one batch window
#[derive(Default)]
struct Batch {
    txn: KvsTxn,
    transitions: Vec<Transition>,
    responses: Vec<oneshot::Sender<()>>,
}

#[derive(Default)]
struct Inner {
    current: Option<(u64, Batch)>,
    /// Window timer for the current batch; aborted when something else
    /// (shutdown) flushes first
    timer: Option<JoinHandle<()>>,
    next_id: u64,
}

/// Accumulates eventlog appends and post-commit work in timed batches
pub struct BatchEngine<K, B> {
    kvs: K,
    bus: B,
    window: Duration,
    fatal: mpsc::UnboundedSender<Fatal>,
    inner: Arc<Mutex<Inner>>,
    /// In-flight commit/publish continuations, joined on shutdown
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl<K, B> Clone for BatchEngine<K, B>
where
    K: KvsClient,
    B: PubBus,
{
    fn clone(&self) -> Self {
        Self {
            kvs: self.kvs.clone(),
            bus: self.bus.clone(),
            window: self.window,
            fatal: self.fatal.clone(),
            inner: Arc::clone(&self.inner),
            tasks: Arc::clone(&self.tasks),
        }
    }
}

impl<K, B> BatchEngine<K, B>
where
    K: KvsClient,
    B: PubBus,
{
    pub fn new(kvs: K, bus: B, window: Duration, fatal: mpsc::UnboundedSender<Fatal>) -> Self {
        Self {
            kvs,
            bus,
            window,
            fatal,
            inner: Arc::new(Mutex::new(Inner::default())),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add an eventlog append for `id` to the current batch
    pub fn append(&self, id: JobId, entry: &EventEntry) -> Result<(), EventError> {
        let line = entry.encode()?;
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let batch = self.start_batch(&mut inner);
        batch.txn.append(id.eventlog_key(), line);
        Ok(())
    }

    /// Queue a state-transition notification for the current batch
    pub fn pub_state(&self, id: JobId, state: JobState, timestamp: f64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let batch = self.start_batch(&mut inner);
        batch.transitions.push(Transition {
            id,
            state,
            timestamp,
        });
    }

    /// Register a reply to be sent once the current batch commits.
    ///
    /// The sender fires after a successful commit; it is dropped (closing
    /// the channel) if the commit fails.
    pub fn respond_on_commit(&self, response: oneshot::Sender<()>) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let batch = self.start_batch(&mut inner);
        batch.responses.push(response);
    }

    /// Close the current batch, if any, and commit it
    pub fn flush(&self) {
        let batch = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(timer) = inner.timer.take() {
                timer.abort();
            }
            inner.current.take()
        };
        if let Some((_, batch)) = batch {
            self.commit(batch);
        }
    }

    /// Flush all pending work and wait for in-flight commits and publishes
    pub async fn shutdown(&self) {
        self.flush();
        loop {
            let task = {
                let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
                tasks.pop()
            };
            match task {
                Some(task) => {
                    let _ = task.await;
                }
                None => break,
            }
        }
    }

    /// Create the current batch if there is none, arming the window timer
    fn start_batch<'a>(&self, inner: &'a mut Inner) -> &'a mut Batch {
        if inner.current.is_none() {
            let id = inner.next_id;
            inner.next_id += 1;
            inner.current = Some((id, Batch::default()));

            let this = self.clone();
            inner.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(this.window).await;
                this.flush_if(id);
            }));
        }
        let (_, batch) = inner
            .current
            .get_or_insert_with(|| (0, Batch::default()));
        batch
    }

    /// Timer continuation: flush only if the armed batch is still current
    fn flush_if(&self, id: u64) {
        let batch = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            let still_current = matches!(&inner.current, Some((current, _)) if *current == id);
            if still_current {
                // Our own timer handle; the task is already finishing
                inner.timer.take();
                inner.current.take()
            } else {
                None
            }
        };
        if let Some((_, batch)) = batch {
            self.commit(batch);
        }
    }

    /// Commit the batch's transaction, then run its post-commit actions
    fn commit(&self, batch: Batch) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let Batch {
                txn,
                transitions,
                responses,
            } = batch;

            if !txn.is_empty() {
                if let Err(err) = this.kvs.commit(txn).await {
                    tracing::error!(error = %err, "eventlog commit failed");
                    let _ = this.fatal.send(err.into());
                    // Dropping the responses closes their channels
                    return;
                }
            }

            if !transitions.is_empty() {
                let payload = json!({
                    "transitions": transitions
                        .iter()
                        .map(|t| json!([t.id, t.state.name(), t.timestamp]))
                        .collect::<Vec<_>>(),
                });
                if let Err(err) = this.bus.publish("job-state", payload).await {
                    tracing::error!(error = %err, "job-state publish failed");
                    let _ = this.fatal.send(err.into());
                }
            }

            for response in responses {
                let _ = response.send(());
            }
        });
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
