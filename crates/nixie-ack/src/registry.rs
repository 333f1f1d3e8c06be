//! Correlation registry
//!
//! TigerStyle: One atomic insert-if-absent is the whole mutual exclusion
//! story.
//!
//! Sessions and forwarders are both named deterministically from the
//! correlation id (`prefix + correlation-id`). Uniqueness of those names in
//! the shared set below is the sole arbiter of "is this correlation id
//! already in use" - there is no separate lock table. Releasing happens on
//! drop of the reservation, so a panicking session still frees its name.

use nixie_core::constants::{
    AGGREGATOR_NAME_PREFIX, CORRELATION_ID_LENGTH_BYTES_MAX, FORWARDER_NAME_PREFIX,
};
use nixie_core::error::{Error, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Process-wide registry of in-use correlation-derived names
///
/// Cloning is cheap; clones share the same name set.
#[derive(Debug, Clone, Default)]
pub struct CorrelationRegistry {
    names: Arc<Mutex<HashSet<String>>>,
}

impl CorrelationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the aggregation-session name for a correlation id
    ///
    /// # Errors
    /// Returns `DuplicateCorrelationId` if a session for this correlation id
    /// is already active, or a validation error for unusable correlation ids.
    pub fn reserve_aggregator(&self, correlation_id: &str) -> Result<NameReservation> {
        self.reserve(AGGREGATOR_NAME_PREFIX, correlation_id)
    }

    /// Reserve the forwarder name for a correlation id
    pub fn reserve_forwarder(&self, correlation_id: &str) -> Result<NameReservation> {
        self.reserve(FORWARDER_NAME_PREFIX, correlation_id)
    }

    /// Check whether a session name is currently reserved
    pub fn has_aggregator(&self, correlation_id: &str) -> bool {
        match derived_name(AGGREGATOR_NAME_PREFIX, correlation_id) {
            Ok(name) => self.names.lock().unwrap().contains(&name),
            Err(_) => false,
        }
    }

    /// Check whether a forwarder name is currently reserved
    pub fn has_forwarder(&self, correlation_id: &str) -> bool {
        match derived_name(FORWARDER_NAME_PREFIX, correlation_id) {
            Ok(name) => self.names.lock().unwrap().contains(&name),
            Err(_) => false,
        }
    }

    /// Number of active aggregation sessions
    pub fn active_aggregations(&self) -> usize {
        self.names
            .lock()
            .unwrap()
            .iter()
            .filter(|name| name.starts_with(AGGREGATOR_NAME_PREFIX))
            .count()
    }

    /// Total number of reserved names (sessions plus forwarders)
    pub fn len(&self) -> usize {
        self.names.lock().unwrap().len()
    }

    /// Check if nothing is reserved
    pub fn is_empty(&self) -> bool {
        self.names.lock().unwrap().is_empty()
    }

    fn reserve(&self, prefix: &'static str, correlation_id: &str) -> Result<NameReservation> {
        let name = derived_name(prefix, correlation_id)?;

        let mut names = self.names.lock().unwrap();
        if !names.insert(name.clone()) {
            return Err(Error::DuplicateCorrelationId {
                correlation_id: correlation_id.to_string(),
            });
        }

        Ok(NameReservation {
            names: Arc::clone(&self.names),
            name,
        })
    }
}

/// Derive the unique name for a correlation id under a prefix
///
/// # Errors
/// Returns `MissingCorrelationId` for an empty id, `CorrelationIdTooLong`
/// past the limit. Raised before any task is started.
pub(crate) fn derived_name(prefix: &'static str, correlation_id: &str) -> Result<String> {
    if correlation_id.is_empty() {
        return Err(Error::MissingCorrelationId);
    }

    if correlation_id.len() > CORRELATION_ID_LENGTH_BYTES_MAX {
        return Err(Error::CorrelationIdTooLong {
            length: correlation_id.len(),
            limit: CORRELATION_ID_LENGTH_BYTES_MAX,
        });
    }

    Ok(format!("{}{}", prefix, correlation_id))
}

/// A held name, released when dropped
#[derive(Debug)]
pub struct NameReservation {
    names: Arc<Mutex<HashSet<String>>>,
    name: String,
}

impl NameReservation {
    /// The reserved name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NameReservation {
    fn drop(&mut self) {
        let mut names = self.names.lock().unwrap();
        let removed = names.remove(&self.name);
        debug_assert!(removed, "reservation dropped twice or never inserted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_and_release() {
        let registry = CorrelationRegistry::new();

        let reservation = registry.reserve_aggregator("req-1").unwrap();
        assert_eq!(reservation.name(), "ackagg-req-1");
        assert!(registry.has_aggregator("req-1"));
        assert_eq!(registry.active_aggregations(), 1);

        drop(reservation);
        assert!(!registry.has_aggregator("req-1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = CorrelationRegistry::new();

        let _held = registry.reserve_aggregator("req-1").unwrap();
        let err = registry.reserve_aggregator("req-1").unwrap_err();
        assert!(matches!(err, Error::DuplicateCorrelationId { correlation_id } if correlation_id == "req-1"));

        // Rejection leaves the original reservation in place.
        assert!(registry.has_aggregator("req-1"));
    }

    #[test]
    fn test_session_and_forwarder_names_coexist() {
        let registry = CorrelationRegistry::new();

        let _session = registry.reserve_aggregator("req-1").unwrap();
        let _forwarder = registry.reserve_forwarder("req-1").unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.active_aggregations(), 1);
    }

    #[test]
    fn test_empty_correlation_id_rejected() {
        let registry = CorrelationRegistry::new();
        assert!(matches!(
            registry.reserve_aggregator(""),
            Err(Error::MissingCorrelationId)
        ));
    }

    #[test]
    fn test_overlong_correlation_id_rejected() {
        let registry = CorrelationRegistry::new();
        let long = "a".repeat(CORRELATION_ID_LENGTH_BYTES_MAX + 1);
        assert!(matches!(
            registry.reserve_aggregator(&long),
            Err(Error::CorrelationIdTooLong { .. })
        ));
    }

    #[test]
    fn test_release_allows_reuse() {
        let registry = CorrelationRegistry::new();

        drop(registry.reserve_aggregator("req-1").unwrap());
        assert!(registry.reserve_aggregator("req-1").is_ok());
    }
}
