//! Durable recovery journal.
//!
//! Append-only keyed record store for in-flight rotation state. Entries are
//! kind-tagged JSON envelopes under the `wal/` prefix, keyed by an id
//! generated on write. An entry that survives a crash is the signal that a
//! rotation may have partially completed and must be resumed from the
//! recorded state rather than restarted.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{KeywheelError, Result};
use crate::storage::KeyValueStore;

const LOG_PREFIX: &str = "wal/";

/// Identifier of a recovery journal entry, generated on `put`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecoveryId(String);

impl RecoveryId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an id read back from a persisted work item
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecoveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A journal entry read back from the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryEntry {
    /// Discriminates entry types sharing the log; readers must check it
    pub kind: String,

    pub created_at: DateTime<Utc>,

    /// The recorded payload, decoded by the owning subsystem
    pub data: serde_json::Value,
}

/// Keyed store of [`RecoveryEntry`] records over a [`KeyValueStore`]
#[derive(Clone)]
pub struct RecoveryLog {
    store: Arc<dyn KeyValueStore>,
}

impl RecoveryLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Durably write a kind-tagged entry and return its generated id.
    pub async fn put<T: Serialize>(&self, kind: &str, data: &T) -> Result<RecoveryId> {
        let entry = RecoveryEntry {
            kind: kind.to_string(),
            created_at: Utc::now(),
            data: serde_json::to_value(data).map_err(|e| {
                KeywheelError::serialization(format!("encoding '{}' journal entry", kind), e)
            })?,
        };
        let raw = serde_json::to_vec(&entry).map_err(|e| {
            KeywheelError::serialization(format!("encoding '{}' journal entry", kind), e)
        })?;

        let id = RecoveryId::generate();
        self.store.put(&format!("{}{}", LOG_PREFIX, id), &raw).await?;
        Ok(id)
    }

    /// Read an entry back. Unknown ids are `Ok(None)`, not an error.
    pub async fn get(&self, id: &RecoveryId) -> Result<Option<RecoveryEntry>> {
        let Some(raw) = self.store.get(&format!("{}{}", LOG_PREFIX, id)).await? else {
            return Ok(None);
        };
        let entry = serde_json::from_slice(&raw).map_err(|e| {
            KeywheelError::serialization(format!("decoding journal entry '{}'", id), e)
        })?;
        Ok(Some(entry))
    }

    /// Remove an entry once the state change it recorded is durably
    /// committed.
    pub async fn delete(&self, id: &RecoveryId) -> Result<()> {
        self.store.delete(&format!("{}{}", LOG_PREFIX, id)).await
    }

    /// List the ids of every journal entry, all kinds included.
    pub async fn list(&self) -> Result<Vec<RecoveryId>> {
        Ok(self
            .store
            .list(LOG_PREFIX)
            .await?
            .into_iter()
            .map(RecoveryId::from_string)
            .collect())
    }
}
