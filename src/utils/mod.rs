//! Shared utility functions.

pub mod globs;
