//! Error taxonomy for rotation attempts.

use thiserror::Error;

use crate::errors::KeywheelError;

/// Everything that can go wrong in one rotation attempt.
///
/// The variants distinguish where in the protocol the attempt died, because
/// that decides what state was left behind: `JournalWrite` means nothing
/// changed anywhere, `Connector` means the target system may or may not have
/// applied the password, and `Persist` means the target definitely applied
/// it but the role entity does not say so yet.
#[derive(Debug, Error)]
pub enum RotationError {
    /// The role is not permitted on its connection
    #[error("'{role}' is not an allowed role on connection '{connection}'")]
    NotAllowed { role: String, connection: String },

    /// Transport or plugin failure talking to the target system
    #[error("connector failure: {context}")]
    Connector {
        context: String,
        #[source]
        source: Option<KeywheelError>,
    },

    /// The recovery journal entry could not be written; no state changed
    #[error("error writing recovery journal entry")]
    JournalWrite {
        #[source]
        source: KeywheelError,
    },

    /// The target system reported a different password than requested
    #[error("target system committed a mismatched password for '{username}'")]
    CredentialMismatch { username: String },

    /// The role commit failed after the target system accepted the new
    /// password; the recovery journal entry remains authoritative
    #[error("error committing role after credential update")]
    Persist {
        #[source]
        source: KeywheelError,
    },
}

impl RotationError {
    pub fn not_allowed(role: impl Into<String>, connection: impl Into<String>) -> Self {
        Self::NotAllowed { role: role.into(), connection: connection.into() }
    }

    pub fn connector(context: impl Into<String>, source: Option<KeywheelError>) -> Self {
        Self::Connector { context: context.into(), source }
    }

    pub fn journal_write(source: KeywheelError) -> Self {
        Self::JournalWrite { source }
    }

    pub fn credential_mismatch(username: impl Into<String>) -> Self {
        Self::CredentialMismatch { username: username.into() }
    }

    pub fn persist(source: KeywheelError) -> Self {
        Self::Persist { source }
    }

    /// Whether a retry with the same inputs can be expected to succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RotationError::Connector { .. }
                | RotationError::JournalWrite { .. }
                | RotationError::Persist { .. }
        )
    }

    /// Stable label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            RotationError::NotAllowed { .. } => "not_allowed",
            RotationError::Connector { .. } => "connector",
            RotationError::JournalWrite { .. } => "journal_write",
            RotationError::CredentialMismatch { .. } => "credential_mismatch",
            RotationError::Persist { .. } => "persist",
        }
    }
}
