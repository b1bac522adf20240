// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! KVS client adapter
//!
//! The engine only ever appends to per-job eventlog keys it owns, so the
//! contract is small: build a transaction of ordered appends and commit it
//! atomically. Either every append in a transaction becomes visible or
//! none do.

mod fake;

pub use fake::FakeKvs;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from KVS operations
#[derive(Debug, Error)]
pub enum KvsError {
    #[error("transaction rejected: {0}")]
    Rejected(String),
}

/// A single KVS operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvsOp {
    /// Append `value` to the log at `key`
    Append { key: String, value: String },
}

/// An ordered set of operations committed atomically
#[derive(Debug, Clone, Default)]
pub struct KvsTxn {
    ops: Vec<KvsOp>,
}

impl KvsTxn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.ops.push(KvsOp::Append {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn ops(&self) -> &[KvsOp] {
        &self.ops
    }
}

/// Adapter for the transactional key-value store
#[async_trait]
pub trait KvsClient: Clone + Send + Sync + 'static {
    /// Commit all operations in `txn` atomically, in order
    async fn commit(&self, txn: KvsTxn) -> Result<(), KvsError>;
}
