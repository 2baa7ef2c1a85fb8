//! Configuration module for the exporter.
//!
//! Provides JSON-based configuration loading and validation for:
//! - Database settings (host, org, bucket, token)
//! - GitHub settings (token, API root)
//! - HTTP timeouts

mod app;
mod validation;

pub use app::ExporterConfig;
pub use validation::{ConfigError, expand_env_vars, parse_duration};

// Re-export constants
pub use app::{
    DEFAULT_CONFIG_PATH, DEFAULT_CONNECT_TIMEOUT, DEFAULT_GITHUB_API_URL, DEFAULT_REQUEST_TIMEOUT,
};
