//! # Target-System Connectors
//!
//! The seam between the rotation core and the external systems whose
//! accounts it manages. A [`Connector`] mints and applies credentials; a
//! [`Connection`] pairs one connector instance with its configuration and
//! the lock that guards credential mutation; the [`ConnectorRegistry`] is
//! how the surrounding backend wires connections in by name.

pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::Result;
use crate::utils::globs;

pub use memory::InMemoryConnector;

/// Identity and password applied at the target system
#[derive(Debug, Clone)]
pub struct StaticUserConfig {
    pub username: String,
    pub password: String,
}

/// What the target system reported after a credential change
#[derive(Debug, Clone)]
pub struct SetCredentialsResult {
    pub username: String,

    /// The password the target system actually committed; callers must
    /// verify it equals the one requested
    pub password: String,

    /// When the target system committed the change, if it reports one
    pub rotation_time: Option<DateTime<Utc>>,
}

/// Plugin contract for one kind of target system.
///
/// `set_credentials` must be idempotent under password reuse: re-applying a
/// password the target already holds succeeds and reports that password.
/// Retry of an interrupted rotation depends on this.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Mint a new credential value suitable for the target system.
    async fn generate_credentials(&self) -> Result<String>;

    /// Apply a credential change, returning what was committed.
    async fn set_credentials(
        &self,
        user: StaticUserConfig,
        statements: &[String],
    ) -> Result<SetCredentialsResult>;
}

/// Static configuration of one connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub name: String,

    /// Role names permitted on this connection: exact names, `*` for any,
    /// or glob patterns
    pub allowed_roles: Vec<String>,
}

impl ConnectionConfig {
    pub fn new(name: impl Into<String>, allowed_roles: Vec<String>) -> Self {
        Self { name: name.into(), allowed_roles }
    }

    /// Whether a role may operate on this connection.
    pub fn allows_role(&self, role_name: &str) -> bool {
        globs::list_contains_glob(&self.allowed_roles, role_name)
    }
}

/// One named connection: configuration plus the guarded connector.
///
/// The `RwLock` is the connection's credential lock: rotation holds the read
/// half while generating and applying credentials, so unrelated shared use
/// proceeds but reconfiguration (the write half) excludes in-flight
/// credential work, and vice versa.
pub struct Connection {
    config: ConnectionConfig,
    connector: RwLock<Box<dyn Connector>>,
}

impl Connection {
    pub fn new(config: ConnectionConfig, connector: Box<dyn Connector>) -> Self {
        Self { config, connector: RwLock::new(connector) }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Shared lock for the duration of a credential operation.
    pub async fn connector(&self) -> RwLockReadGuard<'_, Box<dyn Connector>> {
        self.connector.read().await
    }

    /// Exclusive lock for swapping or reconfiguring the connector.
    pub async fn connector_mut(&self) -> RwLockWriteGuard<'_, Box<dyn Connector>> {
        self.connector.write().await
    }
}

/// Name-indexed set of [`Connection`]s
#[derive(Default)]
pub struct ConnectorRegistry {
    connections: parking_lot::RwLock<HashMap<String, Arc<Connection>>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, replacing any previous one with the same name.
    pub fn register(&self, connection: Connection) -> Arc<Connection> {
        let connection = Arc::new(connection);
        self.connections
            .write()
            .insert(connection.config().name.clone(), connection.clone());
        connection
    }

    /// Look a connection up by name.
    pub fn get(&self, name: &str) -> Option<Arc<Connection>> {
        self.connections.read().get(name).cloned()
    }

    /// Drop a connection from the registry.
    pub fn remove(&self, name: &str) -> Option<Arc<Connection>> {
        self.connections.write().remove(name)
    }
}
