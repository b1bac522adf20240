// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pub/sub bus adapter
//!
//! State-transition notifications are broadcast on the bus after the events
//! they describe have committed to the KVS. A publish failure breaks that
//! contract for every observer, which is why the engine treats it as fatal.

mod fake;

pub use fake::FakeBus;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from publishing
#[derive(Debug, Error)]
pub enum PubError {
    #[error("publish failed: {0}")]
    Failed(String),
}

/// Adapter for the broadcast bus
#[async_trait]
pub trait PubBus: Clone + Send + Sync + 'static {
    /// Publish `payload` on `topic`; resolves when the bus has accepted it
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), PubError>;
}
