// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake in-memory KVS for testing

use super::{KvsClient, KvsError, KvsOp, KvsTxn};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

#[derive(Default)]
struct Inner {
    logs: HashMap<String, Vec<String>>,
    commits: usize,
    fail_next: Option<String>,
}

/// Fake KVS that applies transactions to in-memory append logs
///
/// Tests can inject a commit failure with [`FakeKvs::fail_next_commit`] and
/// gate commit completion with [`FakeKvs::hold_commits`] to observe what
/// happens while a commit is in flight.
#[derive(Clone)]
pub struct FakeKvs {
    inner: Arc<Mutex<Inner>>,
    hold: Arc<watch::Sender<bool>>,
}

impl FakeKvs {
    pub fn new() -> Self {
        let (hold, _) = watch::channel(false);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            hold: Arc::new(hold),
        }
    }

    /// All values appended to `key`, in commit order
    pub fn log(&self, key: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .logs
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of successfully committed transactions
    pub fn commit_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).commits
    }

    /// Make the next commit fail with the given reason
    pub fn fail_next_commit(&self, reason: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fail_next = Some(reason.to_string());
    }

    /// Park incoming commits until [`FakeKvs::release_commits`]
    pub fn hold_commits(&self) {
        self.hold.send_replace(true);
    }

    pub fn release_commits(&self) {
        self.hold.send_replace(false);
    }
}

impl Default for FakeKvs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvsClient for FakeKvs {
    async fn commit(&self, txn: KvsTxn) -> Result<(), KvsError> {
        let mut gate = self.hold.subscribe();
        while *gate.borrow_and_update() {
            let _ = gate.changed().await;
        }

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(reason) = inner.fail_next.take() {
            return Err(KvsError::Rejected(reason));
        }
        for op in txn.ops() {
            match op {
                KvsOp::Append { key, value } => {
                    inner.logs.entry(key.clone()).or_default().push(value.clone());
                }
            }
        }
        inner.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
