//! # Observability Infrastructure
//!
//! Structured logging and metrics for the rotation engine. The surrounding
//! backend owns exporters and endpoints; this module only initializes the
//! tracing subscriber and records rotation metrics.

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;
pub use metrics::register_metrics;
