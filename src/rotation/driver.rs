//! One rotation pass over the due portion of the queue.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, instrument, warn};

use crate::domain;
use crate::errors::Result;
use crate::observability::metrics;
use crate::queue::{RotationItem, RotationQueue};
use crate::rotation::rotator::{RotationInput, StaticAccountRotator};
use crate::storage::RoleStore;

/// Drains the queue of due rotation work, once per scheduler tick.
///
/// A pass processes each due item exactly once and stops at the first item
/// that is not yet due (by priority ordering, everything behind it is due
/// later still). Failed attempts are rescheduled a short backoff into the
/// future instead of retried in place, so one broken role cannot stall the
/// rest of the queue.
#[derive(Clone)]
pub struct RotationPassDriver {
    queue: Arc<RotationQueue>,
    role_store: RoleStore,
    rotator: Arc<StaticAccountRotator>,
    retry_backoff: Duration,
}

impl RotationPassDriver {
    pub fn new(
        queue: Arc<RotationQueue>,
        role_store: RoleStore,
        rotator: Arc<StaticAccountRotator>,
        retry_backoff: Duration,
    ) -> Self {
        Self { queue, role_store, rotator, retry_backoff }
    }

    /// Run one rotation pass.
    ///
    /// Per-item problems (missing roles, failed attempts) are logged and
    /// the loop continues; only the queue running dry or reaching work that
    /// is not yet due ends the pass.
    #[instrument(skip(self))]
    pub async fn run_rotation_pass(&self) -> Result<()> {
        let started = std::time::Instant::now();

        loop {
            let Some(item) = self.queue.pop() else {
                break;
            };

            let role = match self.role_store.load(&item.key).await {
                Ok(Some(role)) => role,
                Ok(None) => {
                    warn!(role = %item.key, "role not found, dropping rotation item");
                    continue;
                }
                Err(err) => {
                    warn!(role = %item.key, error = %err, "unable to load role, dropping rotation item");
                    continue;
                }
            };

            if item.priority > Utc::now().timestamp() {
                // The earliest pending item is not yet due; push it back
                // untouched and end the pass.
                self.push_or_warn(item);
                break;
            }

            let RotationItem { key, value, .. } = item;

            let mut input = RotationInput::rotate(key.clone(), role);
            if let Some(id) = value {
                if let Some(record) = self.rotator.recovery_for_item(&id).await {
                    if !record.new_password.is_empty() {
                        input.password = Some(record.new_password);
                        input.recovery_id = Some(id);
                    }
                }
            }
            let rotation_period = input.role.static_account.rotation_period;

            match self.rotator.attempt_rotation(input).await {
                Ok(outcome) => {
                    for warning in &outcome.warnings {
                        warn!(role = %key, error = %warning, "rotation cleanup failed; stale journal entry left behind");
                    }
                    metrics::rotation_succeeded();

                    let next = domain::next_rotation(outcome.rotation_time, rotation_period);
                    self.push_or_warn(RotationItem {
                        key,
                        priority: next.timestamp(),
                        value: None,
                    });
                }
                Err(failure) => {
                    if failure.error.is_retryable() {
                        warn!(role = %key, error = %failure.error, "unable to rotate credentials in scheduled pass");
                    } else {
                        error!(role = %key, error = %failure.error, "unable to rotate credentials in scheduled pass");
                    }
                    metrics::rotation_failed(failure.error.kind());

                    let retry_at = Utc::now().timestamp() + self.retry_backoff.as_secs() as i64;
                    self.push_or_warn(RotationItem {
                        key,
                        priority: retry_at,
                        value: failure.recovery_id,
                    });
                }
            }
        }

        metrics::set_queue_depth(self.queue.len());
        metrics::record_pass_duration(started.elapsed().as_secs_f64());
        Ok(())
    }

    // A failed requeue loses the role's schedule until the queue is rebuilt
    // (restart priming, or the role's config is touched); surfaced as a
    // warning and a counter rather than failing the pass.
    fn push_or_warn(&self, item: RotationItem) {
        let key = item.key.clone();
        if let Err(error) = self.queue.push(item) {
            warn!(role = %key, %error, "unable to push item onto rotation queue");
            metrics::rotation_requeue_failed();
        }
    }
}
