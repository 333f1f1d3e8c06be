//! Signal headers
//!
//! Headers are an opaque string bag that the aggregation core propagates
//! without interpreting, except for the handful of well-known keys below
//! which it reads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Header key carrying the correlation id of a signal
pub const HEADER_CORRELATION_ID: &str = "correlation-id";

/// Header key carrying the requested timeout (`250ms`, `10s`, `1m`, bare = seconds)
pub const HEADER_TIMEOUT: &str = "timeout";

/// Header key carrying the requested acknowledgement labels (JSON array or comma list)
pub const HEADER_REQUESTED_ACKS: &str = "requested-acks";

/// Header key signalling whether the caller expects a response (default: true)
pub const HEADER_RESPONSE_REQUIRED: &str = "response-required";

/// Opaque header bag attached to signals, acknowledgements, and results
///
/// Keys iterate in a stable order so serialized forms are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers {
    entries: BTreeMap<String, String>,
}

impl Headers {
    /// Create an empty header bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a header value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert a header, replacing any previous value
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Check whether a header key is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the bag is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// Set an arbitrary header
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.put(key, value);
        self
    }

    /// Set the correlation id
    pub fn with_correlation_id(self, correlation_id: impl Into<String>) -> Self {
        self.with(HEADER_CORRELATION_ID, correlation_id)
    }

    /// Set the requested timeout
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with(HEADER_TIMEOUT, format!("{}ms", timeout.as_millis()))
    }

    /// Set the requested acknowledgement labels
    ///
    /// An empty iterator produces an explicit empty list, which is an opt-out
    /// distinct from the header being absent.
    pub fn with_requested_acks<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let value = serde_json::to_string(&labels).unwrap_or_else(|_| "[]".to_string());
        self.with(HEADER_REQUESTED_ACKS, value)
    }

    /// Set whether a response is required
    pub fn with_response_required(self, required: bool) -> Self {
        self.with(HEADER_RESPONSE_REQUIRED, if required { "true" } else { "false" })
    }

    // =========================================================================
    // Typed Reads
    // =========================================================================

    /// Read the correlation id, treating an empty value as absent
    pub fn correlation_id(&self) -> Option<&str> {
        self.get(HEADER_CORRELATION_ID).filter(|v| !v.is_empty())
    }

    /// Read the requested timeout, if present and parseable
    pub fn timeout(&self) -> Option<Duration> {
        parse_timeout(self.get(HEADER_TIMEOUT)?)
    }

    /// Read the requested acknowledgement labels
    ///
    /// Returns `None` when the header is absent, `Some(labels)` otherwise.
    /// `Some(vec![])` is an explicit empty request set. Accepts a JSON array
    /// of strings or a comma-separated list.
    pub fn requested_acks(&self) -> Option<Vec<String>> {
        let raw = self.get(HEADER_REQUESTED_ACKS)?.trim();
        if raw.is_empty() {
            return Some(Vec::new());
        }
        if raw.starts_with('[') {
            if let Ok(labels) = serde_json::from_str::<Vec<String>>(raw) {
                return Some(labels);
            }
        }
        Some(
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// Read whether the caller expects a response (absent means yes)
    pub fn is_response_required(&self) -> bool {
        self.get(HEADER_RESPONSE_REQUIRED) != Some("false")
    }
}

/// Parse a timeout value: `250ms`, `10s`, `1m`, or bare digits meaning seconds
fn parse_timeout(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Some(millis) = raw.strip_suffix("ms") {
        return millis.trim().parse().ok().map(Duration::from_millis);
    }
    if let Some(secs) = raw.strip_suffix('s') {
        return secs.trim().parse().ok().map(Duration::from_secs);
    }
    if let Some(mins) = raw.strip_suffix('m') {
        return mins.trim().parse::<u64>().ok().map(|m| Duration::from_secs(m * 60));
    }
    raw.parse().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_roundtrip() {
        let headers = Headers::new()
            .with_correlation_id("req-1")
            .with("custom-key", "custom-value");
        assert_eq!(headers.correlation_id(), Some("req-1"));
        assert_eq!(headers.get("custom-key"), Some("custom-value"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_empty_correlation_id_is_absent() {
        let headers = Headers::new().with_correlation_id("");
        assert_eq!(headers.correlation_id(), None);
    }

    #[test]
    fn test_timeout_formats() {
        assert_eq!(parse_timeout("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_timeout("10s"), Some(Duration::from_secs(10)));
        assert_eq!(parse_timeout("1m"), Some(Duration::from_secs(60)));
        assert_eq!(parse_timeout("42"), Some(Duration::from_secs(42)));
        assert_eq!(parse_timeout("not-a-number"), None);
    }

    #[test]
    fn test_timeout_builder_roundtrip() {
        let headers = Headers::new().with_timeout(Duration::from_secs(5));
        assert_eq!(headers.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_requested_acks_absent_vs_empty() {
        assert_eq!(Headers::new().requested_acks(), None);

        let empty = Headers::new().with_requested_acks(Vec::<String>::new());
        assert_eq!(empty.requested_acks(), Some(Vec::new()));
    }

    #[test]
    fn test_requested_acks_json_and_comma_forms() {
        let json = Headers::new().with(HEADER_REQUESTED_ACKS, r#"["persisted","custom-a"]"#);
        assert_eq!(
            json.requested_acks(),
            Some(vec!["persisted".to_string(), "custom-a".to_string()])
        );

        let comma = Headers::new().with(HEADER_REQUESTED_ACKS, "persisted, custom-a");
        assert_eq!(
            comma.requested_acks(),
            Some(vec!["persisted".to_string(), "custom-a".to_string()])
        );
    }

    #[test]
    fn test_response_required_defaults_true() {
        assert!(Headers::new().is_response_required());
        assert!(!Headers::new().with_response_required(false).is_response_required());
    }

    #[test]
    fn test_serde_transparent() {
        let headers = Headers::new().with_correlation_id("req-1");
        let json = serde_json::to_string(&headers).unwrap();
        assert_eq!(json, r#"{"correlation-id":"req-1"}"#);
    }
}
