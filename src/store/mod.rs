//! Shared state store subsystem.
//!
//! # Data Flow
//! ```text
//! Checker (any worker)
//!     → keys.rs (build zone/peer scoped key)
//!     → SharedStore (atomic get / set / add / incr)
//!     → visible to every other worker holding the same store
//! ```
//!
//! # Design Decisions
//! - The store is the only state shared between workers
//! - Every mutation is a single atomic operation; no transactions
//! - `add` doubles as the mutex primitive (fails with `Exists`)
//! - Values are plain integers: counters, versions and down flags

pub mod keys;
pub mod memory;

use std::time::Duration;
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;

/// Errors returned by store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// `add` found a live value under the key.
    #[error("exists")]
    Exists,

    /// `incr` on an absent key.
    #[error("not found")]
    NotFound,

    /// The counter would leave the i64 range.
    #[error("counter overflow")]
    Overflow,

    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Atomic key-value operations used as the coordination substrate.
#[async_trait]
pub trait SharedStore: Send + Sync + std::fmt::Debug {
    /// Read a key. Expired keys read as absent.
    async fn get(&self, key: &str) -> StoreResult<Option<i64>>;

    /// Unconditionally write a key without expiry.
    async fn set(&self, key: &str, value: i64) -> StoreResult<()>;

    /// Write a key only if it is absent (or expired).
    ///
    /// Returns [`StoreError::Exists`] when a live value is already present.
    async fn add(&self, key: &str, value: i64, ttl: Option<Duration>) -> StoreResult<()>;

    /// Atomically add `delta` to an existing key and return the new value.
    async fn incr(&self, key: &str, delta: i64) -> StoreResult<i64>;
}
