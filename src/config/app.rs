//! Exporter configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::validation::{ConfigError, expand_env_vars};

// =============================================================================
// Constants
// =============================================================================

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "github_exporter.json";

/// Default GitHub REST API root.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default per-request timeout (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const WRITE_PATH: &str = "api/v2/write";

fn default_github_api_url() -> String {
    DEFAULT_GITHUB_API_URL.to_string()
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

// =============================================================================
// Exporter Configuration
// =============================================================================

/// Top-level exporter configuration, read from a JSON file.
///
/// The five required keys default to empty strings so that a missing key is
/// reported by [`ExporterConfig::validate`] with the field name rather than
/// as a generic parse error.
#[derive(Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Destination bucket.
    #[serde(rename = "Bucket", default)]
    pub bucket: String,

    /// Database host, `influx.example.com[:port]` or a full base URL.
    #[serde(rename = "InfluxDBHost", default)]
    pub influxdb_host: String,

    /// Database API token.
    #[serde(rename = "InfluxDBApiToken", default)]
    pub influxdb_api_token: String,

    /// Database organization.
    #[serde(rename = "Org", default)]
    pub org: String,

    /// GitHub personal access token.
    #[serde(rename = "GithubApiToken", default)]
    pub github_api_token: String,

    /// GitHub REST API root (default: `https://api.github.com`).
    #[serde(rename = "GithubApiUrl", default = "default_github_api_url")]
    pub github_api_url: String,

    /// Per-request timeout (default: 30s).
    #[serde(
        rename = "RequestTimeout",
        default = "default_request_timeout",
        with = "humantime_serde"
    )]
    pub request_timeout: Duration,

    /// TCP connect timeout (default: 30s).
    #[serde(
        rename = "ConnectTimeout",
        default = "default_connect_timeout",
        with = "humantime_serde"
    )]
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("bucket", &self.bucket)
            .field("influxdb_host", &self.influxdb_host)
            .field("influxdb_api_token", &"<redacted>")
            .field("org", &self.org)
            .field("github_api_token", &"<redacted>")
            .field("github_api_url", &self.github_api_url)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ExporterConfig {
    /// Load configuration from a JSON file.
    ///
    /// `${VAR}` and `${VAR:-default}` references in the two tokens are
    /// expanded from the environment before validation.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.influxdb_api_token = expand_env_vars(&config.influxdb_api_token);
        config.github_api_token = expand_env_vars(&config.github_api_token);
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` naming the first missing or
    /// malformed field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("Bucket", &self.bucket),
            ("InfluxDBHost", &self.influxdb_host),
            ("InfluxDBApiToken", &self.influxdb_api_token),
            ("Org", &self.org),
            ("GithubApiToken", &self.github_api_token),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{key} is required")));
            }
        }

        self.write_url()?;

        Url::parse(&self.github_api_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "invalid GithubApiUrl '{}': {e}",
                self.github_api_url
            ))
        })?;

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "RequestTimeout must be positive".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "ConnectTimeout must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Database write endpoint:
    /// `https://{host}/api/v2/write?precision=s&org={org}&bucket={bucket}`.
    ///
    /// A host already carrying an `http://` or `https://` scheme is used as
    /// the base URL verbatim.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if the host does not form a URL.
    pub fn write_url(&self) -> Result<Url, ConfigError> {
        let host = self.influxdb_host.trim().trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}/")
        } else {
            format!("https://{host}/")
        };

        let invalid = |e: url::ParseError| {
            ConfigError::ValidationError(format!(
                "invalid InfluxDBHost '{}': {e}",
                self.influxdb_host
            ))
        };

        let mut url = Url::parse(&base)
            .and_then(|base| base.join(WRITE_PATH))
            .map_err(invalid)?;
        url.query_pairs_mut()
            .append_pair("precision", "s")
            .append_pair("org", &self.org)
            .append_pair("bucket", &self.bucket);
        Ok(url)
    }
}
