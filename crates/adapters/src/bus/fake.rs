// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake pub/sub bus for testing

use super::{PubBus, PubError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    published: Vec<(String, Value)>,
    fail_next: Option<String>,
}

/// Fake bus that records published messages
#[derive(Clone, Default)]
pub struct FakeBus {
    inner: Arc<Mutex<Inner>>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// All published messages, in publish order
    pub fn published(&self) -> Vec<(String, Value)> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .published
            .clone()
    }

    /// Messages published on one topic
    pub fn on_topic(&self, topic: &str) -> Vec<Value> {
        self.published()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload)
            .collect()
    }

    /// Make the next publish fail with the given reason
    pub fn fail_next_publish(&self, reason: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fail_next = Some(reason.to_string());
    }
}

#[async_trait]
impl PubBus for FakeBus {
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), PubError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(reason) = inner.fail_next.take() {
            return Err(PubError::Failed(reason));
        }
        inner.published.push((topic.to_string(), payload));
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
