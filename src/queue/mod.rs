//! # Rotation Priority Queue
//!
//! Ordered structure of rotation work items, keyed by role name and ordered
//! by next-due Unix timestamp (smallest first). The queue holds at most one
//! item per role; role create/delete paths may push and remove concurrently
//! with the rotation pass, so all access is serialized internally.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use thiserror::Error;

use crate::storage::RecoveryId;

/// Errors raised by queue mutations
#[derive(Debug, Error)]
pub enum QueueError {
    /// The role already has an outstanding work item
    #[error("an item with key '{key}' is already queued")]
    DuplicateKey { key: String },
}

/// One unit of rotation work
#[derive(Debug, Clone, PartialEq)]
pub struct RotationItem {
    /// Role name; unique within the queue
    pub key: String,

    /// Unix timestamp at which the item becomes due
    pub priority: i64,

    /// Recovery journal id carried forward from a failed attempt, so the
    /// next attempt resumes instead of restarting
    pub value: Option<RecoveryId>,
}

#[derive(Default)]
struct QueueInner {
    // (priority, key) keeps equal priorities ordered deterministically by key.
    ordered: BTreeMap<(i64, String), RotationItem>,
    index: HashMap<String, i64>,
}

/// Min-priority queue of [`RotationItem`]s, internally synchronized
#[derive(Default)]
pub struct RotationQueue {
    inner: Mutex<QueueInner>,
}

impl RotationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item. Each role may have only one outstanding item.
    pub fn push(&self, item: RotationItem) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        if inner.index.contains_key(&item.key) {
            return Err(QueueError::DuplicateKey { key: item.key });
        }
        inner.index.insert(item.key.clone(), item.priority);
        inner.ordered.insert((item.priority, item.key.clone()), item);
        Ok(())
    }

    /// Remove and return the item with the smallest priority, `None` when
    /// the queue is empty.
    pub fn pop(&self) -> Option<RotationItem> {
        let mut inner = self.inner.lock();
        let (_, item) = inner.ordered.pop_first()?;
        inner.index.remove(&item.key);
        Some(item)
    }

    /// Retract a role's outstanding item, returning it if one was queued.
    pub fn remove(&self, key: &str) -> Option<RotationItem> {
        let mut inner = self.inner.lock();
        let priority = inner.index.remove(key)?;
        inner.ordered.remove(&(priority, key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().ordered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, priority: i64) -> RotationItem {
        RotationItem { key: key.into(), priority, value: None }
    }

    #[test]
    fn test_pop_returns_lowest_priority_first() {
        let queue = RotationQueue::new();
        queue.push(item("c", 300)).unwrap();
        queue.push(item("a", 100)).unwrap();
        queue.push(item("b", 200)).unwrap();

        assert_eq!(queue.pop().unwrap().key, "a");
        assert_eq!(queue.pop().unwrap().key, "b");
        assert_eq!(queue.pop().unwrap().key, "c");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let queue = RotationQueue::new();
        queue.push(item("a", 100)).unwrap();

        let error = queue.push(item("a", 500)).unwrap_err();
        assert!(matches!(error, QueueError::DuplicateKey { .. }));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_equal_priorities_pop_in_key_order() {
        let queue = RotationQueue::new();
        queue.push(item("b", 100)).unwrap();
        queue.push(item("a", 100)).unwrap();

        assert_eq!(queue.pop().unwrap().key, "a");
        assert_eq!(queue.pop().unwrap().key, "b");
    }

    #[test]
    fn test_remove_retracts_item() {
        let queue = RotationQueue::new();
        queue.push(item("a", 100)).unwrap();
        queue.push(item("b", 200)).unwrap();

        let removed = queue.remove("a").unwrap();
        assert_eq!(removed.priority, 100);
        assert!(queue.remove("a").is_none());

        // the key can be queued again after removal
        queue.push(item("a", 300)).unwrap();
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_item_keeps_recovery_payload() {
        let queue = RotationQueue::new();
        let id = crate::storage::RecoveryId::from_string("abc".into());
        queue
            .push(RotationItem { key: "a".into(), priority: 1, value: Some(id.clone()) })
            .unwrap();

        assert_eq!(queue.pop().unwrap().value, Some(id));
    }
}
