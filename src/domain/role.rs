//! Role entity for static service accounts.
//!
//! Roles are owned and validated by the surrounding backend's configuration
//! layer; the rotation core only loads them by name, stamps the outcome of a
//! successful rotation, and persists them back.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A role binding a static account at a target system to a connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    /// Name of the connection this role's account lives on
    pub db_name: String,

    /// Command templates applied at the target system
    #[serde(default)]
    pub statements: Statements,

    /// The managed account and its rotation state
    pub static_account: StaticAccount,
}

/// Command templates for account creation and password rotation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Statements {
    #[serde(default)]
    pub creation: Vec<String>,

    #[serde(default)]
    pub rotation: Vec<String>,
}

/// A static account whose password is rotated in place
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaticAccount {
    pub username: String,

    /// The last password this core successfully committed to the target
    /// system. Never updated in storage before the target confirmed it.
    pub password: String,

    /// When the password was last committed, `None` for accounts that have
    /// never been rotated
    pub last_rotation: Option<DateTime<Utc>>,

    /// Interval after which the password must be changed again
    pub rotation_period: Duration,
}

/// Compute when the next rotation is due, saturating instead of overflowing
/// for absurd periods.
pub fn next_rotation(from: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
    let delta = chrono::Duration::from_std(period).unwrap_or(chrono::Duration::MAX);
    from.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_rotation_adds_period() {
        let from = Utc::now();
        let due = next_rotation(from, Duration::from_secs(86_400));
        assert_eq!(due - from, chrono::Duration::seconds(86_400));
    }

    #[test]
    fn next_rotation_saturates_on_overflow() {
        let due = next_rotation(Utc::now(), Duration::from_secs(u64::MAX));
        assert_eq!(due, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn role_round_trips_through_json() {
        let role = Role {
            db_name: "postgres-prod".into(),
            statements: Statements {
                creation: vec!["CREATE ROLE \"{{name}}\" WITH LOGIN PASSWORD '{{password}}';".into()],
                rotation: vec!["ALTER USER \"{{name}}\" WITH PASSWORD '{{password}}';".into()],
            },
            static_account: StaticAccount {
                username: "app-user".into(),
                password: "initial".into(),
                last_rotation: None,
                rotation_period: Duration::from_secs(3600),
            },
        };

        let json = serde_json::to_vec(&role).unwrap();
        let back: Role = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, role);
    }
}
