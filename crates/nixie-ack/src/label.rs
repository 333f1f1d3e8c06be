//! Acknowledgement labels and requests
//!
//! TigerStyle: Explicit validation on construction, immutable after creation.

use nixie_core::constants::ACK_LABEL_LENGTH_BYTES_MAX;
use nixie_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The built-in durability label, requested implicitly when a signal asks
/// for a response but names no acknowledgements of its own.
const PERSISTED_LABEL: &str = "persisted";

/// Name of one expected acknowledgement channel
///
/// Labels are opaque, comparable, and unique within one request's set.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AckLabel(String);

impl AckLabel {
    /// Create a new label with validation
    ///
    /// # Errors
    /// Returns error if the label is empty, exceeds the length limit, or
    /// contains invalid characters.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();

        if label.is_empty() {
            return Err(Error::invalid_ack_label(label, "must not be empty"));
        }

        if label.len() > ACK_LABEL_LENGTH_BYTES_MAX {
            return Err(Error::AckLabelTooLong {
                length: label.len(),
                limit: ACK_LABEL_LENGTH_BYTES_MAX,
            });
        }

        let valid = label
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '.');
        if !valid {
            return Err(Error::invalid_ack_label(label, "contains invalid characters"));
        }

        Ok(Self(label))
    }

    /// The built-in persisted label
    pub fn persisted() -> Self {
        Self(PERSISTED_LABEL.to_string())
    }

    /// Check whether this is the built-in persisted label
    pub fn is_persisted(&self) -> bool {
        self.0 == PERSISTED_LABEL
    }

    /// Get the label as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AckLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One requested acknowledgement, captured from the originating signal's
/// headers and immutable afterwards
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AckRequest {
    label: AckLabel,
}

impl AckRequest {
    /// Create a request for the given label
    pub fn new(label: AckLabel) -> Self {
        Self { label }
    }

    /// Parse a request from a raw label string
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(Self::new(AckLabel::new(raw)?))
    }

    /// Get the requested label
    pub fn label(&self) -> &AckLabel {
        &self.label
    }
}
