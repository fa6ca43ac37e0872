//! # Error Handling
//!
//! Crate-wide error type for the keywheel rotation engine, built on
//! `thiserror`. Rotation-specific failures carry their own taxonomy in
//! [`crate::rotation::RotationError`]; this type covers the shared concerns
//! (configuration, storage, serialization) those errors wrap.

/// Custom result type for keywheel operations
pub type Result<T> = std::result::Result<T, KeywheelError>;

/// Main error type for the keywheel rotation engine
#[derive(thiserror::Error, Debug)]
pub enum KeywheelError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Persistent storage errors
    #[error("Storage error: {context}")]
    Storage {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Resource not found errors
    #[error("Resource not found: {resource_type} with ID '{id}'")]
    NotFound { resource_type: String, id: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl KeywheelError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a storage error without an underlying source
    pub fn storage<S: Into<String>>(context: S) -> Self {
        Self::Storage { context: context.into(), source: None }
    }

    /// Create a storage error wrapping an underlying source
    pub fn storage_with_source<S: Into<String>>(
        context: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Storage { context: context.into(), source: Some(source) }
    }

    /// Create a serialization error with context
    pub fn serialization<S: Into<String>>(context: S, source: serde_json::Error) -> Self {
        Self::Serialization { context: context.into(), source }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Check if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, KeywheelError::Storage { .. })
    }
}

impl From<serde_json::Error> for KeywheelError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { context: "JSON serialization failed".to_string(), source: error }
    }
}
