//! Config errors and the value helpers used while loading.

use std::time::Duration;

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("error reading config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse JSON configuration.
    #[error("error reading configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration validation failed.
    #[error("{0}")]
    ValidationError(String),
}

/// Parse a `--schedule` interval such as `30m`, `6h` or `1d`.
///
/// Whitespace around the value is ignored. Bare numbers are rejected so a
/// cron expression is never mistaken for an interval.
///
/// # Examples
///
/// ```
/// use github_exporter::config::parse_duration;
///
/// assert_eq!(parse_duration("6h").unwrap().as_secs(), 21_600);
/// assert!(parse_duration("0 0 * * * *").is_err());
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    match s.trim() {
        "" => Err("duration string is empty".to_string()),
        trimmed => humantime::parse_duration(trimmed).map_err(|e| e.to_string()),
    }
}

/// Resolve `${VAR}` and `${VAR:-default}` references in a token value.
///
/// Lets `GithubApiToken` and `InfluxDBApiToken` be kept out of the config
/// file. An unset variable without a default resolves to the empty string,
/// which validation then reports as a missing token.
///
/// # Examples
///
/// ```
/// use github_exporter::config::expand_env_vars;
///
/// assert_eq!(expand_env_vars("${GH_EXPORTER_DOC_UNSET:-ghp_x}"), "ghp_x");
/// assert_eq!(expand_env_vars("literal-token"), "literal-token");
/// ```
pub fn expand_env_vars(value: &str) -> String {
    static TOKEN_REF: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let pattern = TOKEN_REF.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("token reference pattern is valid")
    });

    pattern
        .replace_all(value, |caps: &regex::Captures| {
            std::env::var(&caps[1])
                .unwrap_or_else(|_| caps.get(2).map_or("", |m| m.as_str()).to_string())
        })
        .into_owned()
}
