//! The rotate-and-persist state machine for one attempt.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::connectors::{ConnectorRegistry, StaticUserConfig};
use crate::domain::Role;
use crate::errors::KeywheelError;
use crate::rotation::{RotationError, RECOVERY_KIND};
use crate::storage::{RecoveryId, RecoveryLog, RoleStore};

/// Durable record of an in-flight rotation.
///
/// Written before the target system is touched and deleted only after the
/// role entity durably carries the new password. While it exists, its
/// `new_password` is the only value a retry may present to the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub role_name: String,
    pub username: String,

    /// The password already minted (and possibly applied); a retry reuses
    /// it instead of generating another
    pub new_password: String,

    /// Prior state kept for audit and rollback reasoning
    pub old_password: String,

    /// The command templates in effect when the record was written
    #[serde(default)]
    pub statements: Vec<String>,

    pub last_rotation: Option<DateTime<Utc>>,
}

/// Working input for one rotation attempt
#[derive(Debug)]
pub struct RotationInput {
    pub role_name: String,
    pub role: Role,

    /// Password carried over from a recovery record; `None` mints a new one
    pub password: Option<String>,

    /// Apply the creation statements instead of the rotation statements
    pub create_account: bool,

    /// Journal entry of a previous interrupted attempt being resumed
    pub recovery_id: Option<RecoveryId>,
}

impl RotationInput {
    /// Input for a scheduled rotation with no prior state.
    pub fn rotate(role_name: impl Into<String>, role: Role) -> Self {
        Self {
            role_name: role_name.into(),
            role,
            password: None,
            create_account: false,
            recovery_id: None,
        }
    }
}

/// The result of a committed rotation
#[derive(Debug)]
pub struct RotationOutcome {
    /// When the target system committed the change
    pub rotation_time: DateTime<Utc>,

    /// Non-fatal cleanup failures (a stale journal entry is tolerated; a
    /// lost rotation is not)
    pub warnings: Vec<KeywheelError>,
}

/// A failed attempt, carrying the resume token for the next one
#[derive(Debug)]
pub struct RotationFailure {
    /// Journal entry to thread into the requeued work item so the retry
    /// reuses the recorded password
    pub recovery_id: Option<RecoveryId>,

    pub error: RotationError,
}

/// Executes single rotation attempts under the durable-journal protocol
#[derive(Clone)]
pub struct StaticAccountRotator {
    role_store: RoleStore,
    recovery_log: RecoveryLog,
    connections: Arc<ConnectorRegistry>,
}

impl StaticAccountRotator {
    pub fn new(
        role_store: RoleStore,
        recovery_log: RecoveryLog,
        connections: Arc<ConnectorRegistry>,
    ) -> Self {
        Self { role_store, recovery_log, connections }
    }

    /// Perform one rotate-and-persist attempt.
    ///
    /// On failure the returned [`RotationFailure`] carries any journal id
    /// the attempt produced; the caller must thread it into the rescheduled
    /// work item, otherwise the retry would mint (and apply) yet another
    /// password.
    #[instrument(
        skip(self, input),
        fields(role = %input.role_name, connection = %input.role.db_name)
    )]
    pub async fn attempt_rotation(
        &self,
        input: RotationInput,
    ) -> Result<RotationOutcome, RotationFailure> {
        let RotationInput { role_name, mut role, password, create_account, mut recovery_id } =
            input;

        let fail = |recovery_id: &Option<RecoveryId>, error: RotationError| RotationFailure {
            recovery_id: recovery_id.clone(),
            error,
        };

        let connection = match self.connections.get(&role.db_name) {
            Some(connection) => connection,
            None => {
                return Err(fail(
                    &recovery_id,
                    RotationError::connector(
                        format!("no connection named '{}'", role.db_name),
                        None,
                    ),
                ))
            }
        };

        if !connection.config().allows_role(&role_name) {
            return Err(fail(
                &recovery_id,
                RotationError::not_allowed(role_name.as_str(), role.db_name.as_str()),
            ));
        }

        // Shared credential lock for the rest of the attempt: mutation on
        // this connection is serialized, other connections are unaffected.
        let connector = connection.connector().await;

        let new_password = match password {
            Some(reused) => reused,
            None => match connector.generate_credentials().await {
                Ok(minted) => minted,
                Err(e) => {
                    return Err(fail(
                        &recovery_id,
                        RotationError::connector("credential generation failed", Some(e)),
                    ))
                }
            },
        };

        let statements = if create_account {
            role.statements.creation.clone()
        } else {
            role.statements.rotation.clone()
        };

        // The journal entry must be durable, and its id retained, before the
        // target system is touched.
        if recovery_id.is_none() {
            let record = RecoveryRecord {
                role_name: role_name.clone(),
                username: role.static_account.username.clone(),
                new_password: new_password.clone(),
                old_password: role.static_account.password.clone(),
                statements: statements.clone(),
                last_rotation: role.static_account.last_rotation,
            };
            match self.recovery_log.put(RECOVERY_KIND, &record).await {
                Ok(id) => recovery_id = Some(id),
                Err(e) => {
                    return Err(RotationFailure {
                        recovery_id: None,
                        error: RotationError::journal_write(e),
                    })
                }
            }
        }

        let user = StaticUserConfig {
            username: role.static_account.username.clone(),
            password: new_password.clone(),
        };
        let committed = match connector.set_credentials(user, &statements).await {
            Ok(committed) => committed,
            Err(e) => {
                return Err(fail(
                    &recovery_id,
                    RotationError::connector("credential update failed", Some(e)),
                ))
            }
        };

        if committed.password != new_password {
            return Err(fail(
                &recovery_id,
                RotationError::credential_mismatch(role.static_account.username.as_str()),
            ));
        }

        let rotation_time = committed.rotation_time.unwrap_or_else(Utc::now);
        role.static_account.last_rotation = Some(rotation_time);
        role.static_account.password = committed.password;
        if let Err(e) = self.role_store.save(&role_name, &role).await {
            return Err(fail(&recovery_id, RotationError::persist(e)));
        }

        // The rotation is durable; a failed journal cleanup only leaves a
        // stale entry whose recorded password equals the committed one.
        let mut warnings = Vec::new();
        if let Some(id) = recovery_id {
            if let Err(e) = self.recovery_log.delete(&id).await {
                warnings.push(e);
            }
        }

        Ok(RotationOutcome { rotation_time, warnings })
    }

    /// Resolve the recovery record a work item points at.
    ///
    /// Read failures, foreign entry kinds, and undecodable payloads all
    /// resolve to `None`: the attempt then proceeds as a fresh rotation,
    /// which is always safe because no target mutation happened without a
    /// readable record.
    pub async fn recovery_for_item(&self, id: &RecoveryId) -> Option<RecoveryRecord> {
        let entry = match self.recovery_log.get(id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(error) => {
                warn!(recovery_id = %id, %error, "error reading recovery journal entry");
                return None;
            }
        };

        if entry.kind != RECOVERY_KIND {
            return None;
        }

        match serde_json::from_value(entry.data) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(recovery_id = %id, %error, "error decoding recovery journal entry");
                None
            }
        }
    }
}
