//! In-memory connector for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

use crate::connectors::{Connector, SetCredentialsResult, StaticUserConfig};
use crate::errors::Result;

/// A [`Connector`] backed by a process-local account map
#[derive(Debug, Default)]
pub struct InMemoryConnector {
    accounts: RwLock<HashMap<String, String>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current password for an account, if one was ever applied
    pub fn password_for(&self, username: &str) -> Option<String> {
        self.accounts.read().get(username).cloned()
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn generate_credentials(&self) -> Result<String> {
        Ok(OsRng.sample_iter(&Alphanumeric).take(32).map(char::from).collect())
    }

    async fn set_credentials(
        &self,
        user: StaticUserConfig,
        _statements: &[String],
    ) -> Result<SetCredentialsResult> {
        self.accounts.write().insert(user.username.clone(), user.password.clone());
        Ok(SetCredentialsResult {
            username: user.username,
            password: user.password,
            rotation_time: Some(Utc::now()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_credentials_is_idempotent_under_reuse() {
        let connector = InMemoryConnector::new();
        let user = StaticUserConfig { username: "app-user".into(), password: "pw-1".into() };

        let first = connector.set_credentials(user.clone(), &[]).await.unwrap();
        let second = connector.set_credentials(user, &[]).await.unwrap();

        assert_eq!(first.password, "pw-1");
        assert_eq!(second.password, "pw-1");
        assert_eq!(connector.password_for("app-user"), Some("pw-1".to_string()));
    }

    #[tokio::test]
    async fn test_generated_credentials_vary() {
        let connector = InMemoryConnector::new();
        let a = connector.generate_credentials().await.unwrap();
        let b = connector.generate_credentials().await.unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
