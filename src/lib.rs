//! # Keywheel
//!
//! Keywheel is the crash-safe rotation engine for static service-account
//! credentials inside a secrets-management backend. Client systems have
//! fixed-identity accounts whose passwords the backend must change on a
//! schedule without ever losing track of an in-flight rotation, even across
//! process crashes.
//!
//! ## Architecture
//!
//! ```text
//! RotationWorker (ticker) → RotationPassDriver → StaticAccountRotator
//!          ↓                        ↓                     ↓
//!    RotationQueue          RoleStore / RecoveryLog   Connector (per-connection lock)
//! ```
//!
//! ## Core Components
//!
//! - **RotationQueue**: min-priority queue of per-role work items, ordered by
//!   next-due time
//! - **RecoveryLog**: durable journal written before the target system is
//!   touched, so a retry reuses the recorded password instead of minting
//!   another
//! - **StaticAccountRotator**: the rotate-and-persist state machine for one
//!   attempt
//! - **RotationPassDriver / RotationWorker**: drain the due work once per
//!   scheduler tick
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use keywheel::config::Config;
//! use keywheel::connectors::{Connection, ConnectionConfig, ConnectorRegistry, InMemoryConnector};
//! use keywheel::queue::RotationQueue;
//! use keywheel::rotation::{RotationPassDriver, RotationWorker, StaticAccountRotator};
//! use keywheel::storage::{MemoryStore, RecoveryLog, RoleStore};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> keywheel::Result<()> {
//! keywheel::init_tracing()?;
//! let config = Config::from_env()?;
//!
//! let kv = Arc::new(MemoryStore::new());
//! let registry = Arc::new(ConnectorRegistry::new());
//! registry.register(Connection::new(
//!     ConnectionConfig::new("postgres-prod", vec!["*".to_string()]),
//!     Box::new(InMemoryConnector::new()),
//! ));
//!
//! let queue = Arc::new(RotationQueue::new());
//! let role_store = RoleStore::new(kv.clone());
//! let recovery_log = RecoveryLog::new(kv);
//! let rotator = Arc::new(StaticAccountRotator::new(
//!     role_store.clone(),
//!     recovery_log.clone(),
//!     registry,
//! ));
//! let driver = RotationPassDriver::new(
//!     queue.clone(),
//!     role_store.clone(),
//!     rotator,
//!     config.rotation.retry_backoff,
//! );
//!
//! let shutdown = CancellationToken::new();
//! let worker = RotationWorker::new(driver, queue, role_store, recovery_log, config.rotation);
//! let handle = worker.spawn(shutdown.clone());
//!
//! // ... the surrounding backend runs ...
//! shutdown.cancel();
//! handle.await.ok();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connectors;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod queue;
pub mod rotation;
pub mod storage;
pub mod utils;

// Re-export commonly used types and traits
pub use config::Config;
pub use errors::{KeywheelError, Result};
pub use observability::init_tracing;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
