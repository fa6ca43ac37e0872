//! # Static Account Rotation
//!
//! The crash-safe rotation state machine and its drivers. The
//! [`StaticAccountRotator`] performs one rotate-and-persist attempt under
//! the durable-journal protocol; the [`RotationPassDriver`] drains the due
//! portion of the queue once per invocation; the [`RotationWorker`] owns the
//! background loop that invokes a pass on a fixed interval.
//!
//! The write ordering is the heart of the protocol and must not change:
//! journal entry, then target-system mutation, then role commit, then
//! journal cleanup. A crash between any two steps leaves a journal entry
//! behind, and the next attempt for that role resumes from its recorded
//! password instead of minting a fresh one.

pub mod driver;
pub mod error;
pub mod rotator;
pub mod worker;

pub use driver::RotationPassDriver;
pub use error::RotationError;
pub use rotator::{
    RecoveryRecord, RotationFailure, RotationInput, RotationOutcome, StaticAccountRotator,
};
pub use worker::RotationWorker;

/// Journal entry kind for in-flight static account rotations
pub const RECOVERY_KIND: &str = "static-account-rotation";
