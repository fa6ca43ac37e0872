//! Role store accessor.
//!
//! Thin wrapper mapping role names to JSON-shaped [`Role`] entities under the
//! `role/` key prefix. Role validation and lifecycle belong to the
//! surrounding backend; the rotation core only loads, stamps, and saves.

use std::sync::Arc;

use crate::domain::Role;
use crate::errors::{KeywheelError, Result};
use crate::storage::KeyValueStore;

const ROLE_PREFIX: &str = "role/";

/// Accessor for persisted [`Role`] entities
#[derive(Clone)]
pub struct RoleStore {
    store: Arc<dyn KeyValueStore>,
}

impl RoleStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load a role by name, `None` when it does not exist.
    pub async fn load(&self, name: &str) -> Result<Option<Role>> {
        let Some(raw) = self.store.get(&format!("{}{}", ROLE_PREFIX, name)).await? else {
            return Ok(None);
        };
        let role = serde_json::from_slice(&raw).map_err(|e| {
            KeywheelError::serialization(format!("decoding role entry '{}'", name), e)
        })?;
        Ok(Some(role))
    }

    /// Persist a role under its name.
    pub async fn save(&self, name: &str, role: &Role) -> Result<()> {
        let raw = serde_json::to_vec(role).map_err(|e| {
            KeywheelError::serialization(format!("encoding role entry '{}'", name), e)
        })?;
        self.store.put(&format!("{}{}", ROLE_PREFIX, name), &raw).await
    }

    /// Remove a role entry.
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.store.delete(&format!("{}{}", ROLE_PREFIX, name)).await
    }

    /// List all role names.
    pub async fn list(&self) -> Result<Vec<String>> {
        self.store.list(ROLE_PREFIX).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::{StaticAccount, Statements};
    use crate::storage::MemoryStore;

    fn role(username: &str) -> Role {
        Role {
            db_name: "postgres-prod".into(),
            statements: Statements::default(),
            static_account: StaticAccount {
                username: username.into(),
                password: "secret".into(),
                last_rotation: None,
                rotation_period: Duration::from_secs(60),
            },
        }
    }

    #[tokio::test]
    async fn test_load_save_list_delete() {
        let store = RoleStore::new(Arc::new(MemoryStore::new()));

        assert!(store.load("app").await.unwrap().is_none());

        store.save("app", &role("app-user")).await.unwrap();
        store.save("batch", &role("batch-user")).await.unwrap();

        let loaded = store.load("app").await.unwrap().unwrap();
        assert_eq!(loaded.static_account.username, "app-user");

        assert_eq!(store.list().await.unwrap(), vec!["app".to_string(), "batch".to_string()]);

        store.delete("app").await.unwrap();
        assert!(store.load("app").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_serialization_error() {
        let kv = Arc::new(MemoryStore::new());
        kv.put("role/app", b"not json").await.unwrap();

        let store = RoleStore::new(kv);
        let error = store.load("app").await.unwrap_err();
        assert!(matches!(error, KeywheelError::Serialization { .. }));
    }
}
