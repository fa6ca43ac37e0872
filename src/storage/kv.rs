//! Consumed persistent-storage contract.

use async_trait::async_trait;

use crate::errors::Result;

/// Keyed byte storage with atomic per-key operations.
///
/// Implementations must make each `put`/`delete` atomic for its key; no
/// cross-key transaction is assumed anywhere in the crate. The write ordering
/// the rotation protocol relies on is enforced by the callers, not here.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List the keys under `prefix`, with the prefix stripped, in lexical
    /// order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
