//! Observability utilities.

pub mod logging;

pub use logging::{redact_sensitive, LogFormat, LogLevel, LoggingConfig, SENSITIVE_FIELDS};
