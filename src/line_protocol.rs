//! InfluxDB line protocol rendering.
//!
//! A [`Sample`] renders as
//! `measurement,tag1=v1,tag2=v2 field1=v1,field2=v2 <unix-seconds>`.
//! Tags and fields keep insertion order. Field values are unsigned integers
//! written without a type suffix.

use std::fmt;

/// Maximum length of an escaped tag value, in code points.
pub const TAG_VALUE_LIMIT: usize = 1024;

/// Suffix appended to truncated tag values.
pub const TRUNCATION_MARKER: &str = "...";

/// Measurement names written by the collectors.
pub mod measurement {
    pub const CLONES: &str = "github_stats_clones";
    pub const PATHS: &str = "github_stats_paths";
    pub const REFERRALS: &str = "github_stats_referrals";
    pub const VIEWS: &str = "github_stats_views";
    pub const STARS: &str = "github_stats_stars";
    pub const FORKS: &str = "github_stats_forks";
    pub const ACTIONS: &str = "github_stats_actions";
}

/// Escape a free-text value for use as a tag value.
///
/// Commas, then equals signs, then spaces are backslash-escaped. Results
/// longer than [`TAG_VALUE_LIMIT`] code points are cut to
/// `TAG_VALUE_LIMIT - 3` code points followed by [`TRUNCATION_MARKER`].
///
/// # Examples
///
/// ```
/// use github_exporter::line_protocol::escape_tag_value;
///
/// assert_eq!(escape_tag_value("CI, nightly=on"), r"CI\,\ nightly\=on");
/// ```
pub fn escape_tag_value(value: &str) -> String {
    let escaped = value
        .replace(',', r"\,")
        .replace('=', r"\=")
        .replace(' ', r"\ ");

    if escaped.chars().count() <= TAG_VALUE_LIMIT {
        return escaped;
    }

    let keep = TAG_VALUE_LIMIT - TRUNCATION_MARKER.chars().count();
    let mut truncated: String = escaped.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// One line-protocol record.
///
/// Built once with the `with_*` methods and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    measurement: &'static str,
    tags: Vec<(&'static str, String)>,
    fields: Vec<(&'static str, u64)>,
    timestamp: i64,
}

impl Sample {
    /// Start a sample for `measurement` at `timestamp` (Unix seconds).
    pub fn new(measurement: &'static str, timestamp: i64) -> Self {
        Self {
            measurement,
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp,
        }
    }

    /// Add a tag. The value is written verbatim; escape untrusted text first.
    pub fn with_tag(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.tags.push((key, value.into()));
        self
    }

    /// Add an integer field.
    pub fn with_field(mut self, key: &'static str, value: u64) -> Self {
        self.fields.push((key, value));
        self
    }

    pub fn measurement(&self) -> &str {
        self.measurement
    }

    /// Look up a tag value by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a field value by key.
    pub fn field(&self, key: &str) -> Option<u64> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Append this sample and a trailing newline to `out`.
    pub fn write_line(&self, out: &mut String) {
        use std::fmt::Write;
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{self}");
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.measurement)?;
        for (key, value) in &self.tags {
            write!(f, ",{key}={value}")?;
        }
        for (i, (key, value)) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ' ' } else { ',' };
            write!(f, "{sep}{key}={value}")?;
        }
        write!(f, " {}", self.timestamp)
    }
}
