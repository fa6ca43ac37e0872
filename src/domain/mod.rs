//! Domain entities read and committed by the rotation core.

pub mod role;

pub use role::{next_rotation, Role, StaticAccount, Statements};
