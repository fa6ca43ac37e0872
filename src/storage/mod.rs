//! # Storage and Persistence
//!
//! The rotation core consumes persistent storage through the narrow
//! [`KeyValueStore`] contract; the surrounding backend supplies the real
//! implementation. This module carries the contract, an in-memory backend for
//! development and tests, and the two accessors built on top of it: the
//! [`RoleStore`] and the durable [`RecoveryLog`].

pub mod kv;
pub mod memory;
pub mod recovery_log;
pub mod role_store;

pub use kv::KeyValueStore;
pub use memory::MemoryStore;
pub use recovery_log::{RecoveryEntry, RecoveryId, RecoveryLog};
pub use role_store::RoleStore;
