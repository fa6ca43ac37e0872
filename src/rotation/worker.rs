//! Background rotation worker.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::RotationConfig;
use crate::domain;
use crate::errors::Result;
use crate::observability::metrics;
use crate::queue::{RotationItem, RotationQueue};
use crate::rotation::{RecoveryRecord, RotationPassDriver, RECOVERY_KIND};
use crate::storage::{RecoveryId, RecoveryLog, RoleStore};

/// A surviving journal entry, keyed by write time for duplicate resolution
type PendingRecovery = (RecoveryId, RecoveryRecord, DateTime<Utc>);

/// Owns the periodic rotation loop.
///
/// One worker, one pass at a time: a tick that fires while a pass is still
/// running waits for the loop to come back around, so passes never overlap.
pub struct RotationWorker {
    driver: RotationPassDriver,
    queue: Arc<RotationQueue>,
    role_store: RoleStore,
    recovery_log: RecoveryLog,
    config: RotationConfig,
}

impl RotationWorker {
    pub fn new(
        driver: RotationPassDriver,
        queue: Arc<RotationQueue>,
        role_store: RoleStore,
        recovery_log: RecoveryLog,
        config: RotationConfig,
    ) -> Self {
        Self { driver, queue, role_store, recovery_log, config }
    }

    /// Rebuild the queue from the role store.
    ///
    /// Each role gets one item due at `last_rotation + rotation_period`, or
    /// immediately for accounts that have never been rotated. Roles already
    /// queued keep their existing item. A recovery journal entry that
    /// survived a crash is re-attached to its role's item, so the first
    /// attempt resumes from the recorded password; an entry whose password
    /// the role already carries records a change that fully committed, and
    /// is deleted instead.
    #[instrument(skip(self))]
    pub async fn prime_queue(&self) -> Result<()> {
        let mut pending = self.pending_recoveries().await;

        for name in self.role_store.list().await? {
            let role = match self.role_store.load(&name).await {
                Ok(Some(role)) => role,
                Ok(None) => continue,
                Err(err) => {
                    warn!(role = %name, error = %err, "unable to load role while priming rotation queue");
                    continue;
                }
            };

            let value = match pending.remove(&name) {
                Some((id, record, _)) if record.new_password == role.static_account.password => {
                    // only the journal cleanup of this rotation was lost
                    if let Err(error) = self.recovery_log.delete(&id).await {
                        warn!(role = %name, recovery_id = %id, %error, "unable to delete stale recovery journal entry");
                    }
                    None
                }
                Some((id, _, _)) => {
                    info!(role = %name, recovery_id = %id, "resuming interrupted rotation from recovery journal");
                    Some(id)
                }
                None => None,
            };

            let due = role
                .static_account
                .last_rotation
                .map(|last| domain::next_rotation(last, role.static_account.rotation_period))
                .unwrap_or_else(Utc::now);

            let item = RotationItem { key: name, priority: due.timestamp(), value };
            // a duplicate means the role is already scheduled
            let _ = self.queue.push(item);
        }

        for (role, (id, _, _)) in pending {
            warn!(role = %role, recovery_id = %id, "recovery journal entry for unknown role");
        }

        metrics::set_queue_depth(self.queue.len());
        info!(queued = self.queue.len(), "rotation queue primed");
        Ok(())
    }

    /// Collect surviving rotation journal entries, keyed by role name.
    ///
    /// A role with several entries keeps only the most recently written one;
    /// the others are deleted. Unreadable or foreign-kind entries are skipped.
    async fn pending_recoveries(&self) -> HashMap<String, PendingRecovery> {
        let ids = match self.recovery_log.list().await {
            Ok(ids) => ids,
            Err(error) => {
                warn!(%error, "unable to list recovery journal entries while priming");
                return HashMap::new();
            }
        };

        let mut pending: HashMap<String, PendingRecovery> = HashMap::new();
        for id in ids {
            let entry = match self.recovery_log.get(&id).await {
                Ok(Some(entry)) if entry.kind == RECOVERY_KIND => entry,
                Ok(_) => continue,
                Err(error) => {
                    warn!(recovery_id = %id, %error, "error reading recovery journal entry while priming");
                    continue;
                }
            };
            let record: RecoveryRecord = match serde_json::from_value(entry.data) {
                Ok(record) => record,
                Err(error) => {
                    warn!(recovery_id = %id, %error, "error decoding recovery journal entry while priming");
                    continue;
                }
            };

            let role_name = record.role_name.clone();
            let keep_existing = pending
                .get(&role_name)
                .is_some_and(|(_, _, written_at)| *written_at >= entry.created_at);
            let stale = if keep_existing {
                Some(id)
            } else {
                pending
                    .insert(role_name.clone(), (id, record, entry.created_at))
                    .map(|(older, _, _)| older)
            };

            if let Some(stale) = stale {
                warn!(role = %role_name, recovery_id = %stale, "deleting duplicate recovery journal entry");
                if let Err(error) = self.recovery_log.delete(&stale).await {
                    warn!(recovery_id = %stale, %error, "unable to delete duplicate recovery journal entry");
                }
            }
        }
        pending
    }

    /// Spawn the worker loop onto the runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    async fn run(self, shutdown: CancellationToken) {
        if let Err(error) = self.prime_queue().await {
            error!(%error, "unable to prime rotation queue");
        }

        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = self.driver.run_rotation_pass().await {
                        error!(%error, "rotation pass failed");
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("rotation worker shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::connectors::ConnectorRegistry;
    use crate::domain::{Role, StaticAccount, Statements};
    use crate::rotation::StaticAccountRotator;
    use crate::storage::MemoryStore;

    fn role(last_rotation: Option<chrono::DateTime<Utc>>) -> Role {
        Role {
            db_name: "postgres-prod".into(),
            statements: Statements::default(),
            static_account: StaticAccount {
                username: "app-user".into(),
                password: "pw".into(),
                last_rotation,
                rotation_period: Duration::from_secs(3600),
            },
        }
    }

    fn record(role_name: &str, new_password: &str) -> RecoveryRecord {
        RecoveryRecord {
            role_name: role_name.into(),
            username: "app-user".into(),
            new_password: new_password.into(),
            old_password: "pw".into(),
            statements: vec![],
            last_rotation: None,
        }
    }

    fn worker_over(kv: Arc<MemoryStore>, queue: Arc<RotationQueue>) -> RotationWorker {
        let role_store = RoleStore::new(kv.clone());
        let recovery_log = RecoveryLog::new(kv.clone());
        let rotator = Arc::new(StaticAccountRotator::new(
            role_store.clone(),
            recovery_log.clone(),
            Arc::new(ConnectorRegistry::new()),
        ));
        let driver = RotationPassDriver::new(
            queue.clone(),
            role_store.clone(),
            rotator,
            Duration::from_secs(10),
        );
        RotationWorker::new(driver, queue, role_store, recovery_log, RotationConfig::default())
    }

    #[tokio::test]
    async fn test_prime_queue_schedules_every_role_once() {
        let kv = Arc::new(MemoryStore::new());
        let role_store = RoleStore::new(kv.clone());

        let last = Utc::now() - chrono::Duration::seconds(60);
        role_store.save("rotated", &role(Some(last))).await.unwrap();
        role_store.save("fresh", &role(None)).await.unwrap();

        let queue = Arc::new(RotationQueue::new());
        let worker = worker_over(kv, queue.clone());

        worker.prime_queue().await.unwrap();
        assert_eq!(queue.len(), 2);

        // priming again leaves existing items in place
        worker.prime_queue().await.unwrap();
        assert_eq!(queue.len(), 2);

        // the never-rotated account is due now, the rotated one in ~59 min
        let first = queue.pop().unwrap();
        assert_eq!(first.key, "fresh");
        assert!(first.priority <= Utc::now().timestamp());

        let second = queue.pop().unwrap();
        assert_eq!(second.key, "rotated");
        assert_eq!(second.priority, (last + chrono::Duration::seconds(3600)).timestamp());
    }

    #[tokio::test]
    async fn test_prime_queue_attaches_surviving_recovery_entry() {
        let kv = Arc::new(MemoryStore::new());
        let role_store = RoleStore::new(kv.clone());
        let recovery_log = RecoveryLog::new(kv.clone());

        // interrupted rotation: the journal records a password the role
        // entity never received
        role_store.save("app", &role(None)).await.unwrap();
        let id = recovery_log.put(RECOVERY_KIND, &record("app", "in-flight")).await.unwrap();

        let queue = Arc::new(RotationQueue::new());
        worker_over(kv, queue.clone()).prime_queue().await.unwrap();

        let item = queue.pop().unwrap();
        assert_eq!(item.key, "app");
        assert_eq!(item.value, Some(id));
    }

    #[tokio::test]
    async fn test_prime_queue_deletes_already_committed_recovery_entry() {
        let kv = Arc::new(MemoryStore::new());
        let role_store = RoleStore::new(kv.clone());
        let recovery_log = RecoveryLog::new(kv.clone());

        // the role already carries the recorded password: the rotation
        // committed and only the journal cleanup was lost
        role_store.save("app", &role(None)).await.unwrap();
        let id = recovery_log.put(RECOVERY_KIND, &record("app", "pw")).await.unwrap();

        let queue = Arc::new(RotationQueue::new());
        worker_over(kv, queue.clone()).prime_queue().await.unwrap();

        let item = queue.pop().unwrap();
        assert_eq!(item.value, None);
        assert!(recovery_log.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prime_queue_keeps_newest_of_duplicate_entries() {
        let kv = Arc::new(MemoryStore::new());
        let role_store = RoleStore::new(kv.clone());
        let recovery_log = RecoveryLog::new(kv.clone());

        role_store.save("app", &role(None)).await.unwrap();
        let older = recovery_log.put(RECOVERY_KIND, &record("app", "first")).await.unwrap();
        // keep the write timestamps apart
        tokio::time::sleep(Duration::from_millis(5)).await;
        let newer = recovery_log.put(RECOVERY_KIND, &record("app", "second")).await.unwrap();

        let queue = Arc::new(RotationQueue::new());
        worker_over(kv, queue.clone()).prime_queue().await.unwrap();

        let item = queue.pop().unwrap();
        assert_eq!(item.value, Some(newer));
        assert!(recovery_log.get(&older).await.unwrap().is_none());
    }
}
