//! In-memory storage backend.
//!
//! Backs development setups and the test suite. Not durable; production
//! deployments plug their own [`KeyValueStore`] in.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::errors::Result;
use crate::storage::KeyValueStore;

/// Process-local [`KeyValueStore`] over a sorted map
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key[prefix.len()..].to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put("role/app", b"{}").await.unwrap();
        assert_eq!(store.get("role/app").await.unwrap(), Some(b"{}".to_vec()));

        store.delete("role/app").await.unwrap();
        assert_eq!(store.get("role/app").await.unwrap(), None);

        // deleting again is fine
        store.delete("role/app").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_strips_prefix_and_sorts() {
        let store = MemoryStore::new();
        store.put("role/b", b"1").await.unwrap();
        store.put("role/a", b"2").await.unwrap();
        store.put("wal/x", b"3").await.unwrap();

        let keys = store.list("role/").await.unwrap();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
