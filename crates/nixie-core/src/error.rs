//! Error types for Nixie
//!
//! TigerStyle: Explicit error types with context, using thiserror.

use thiserror::Error;

/// Result type alias for Nixie operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nixie error types
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Correlation Errors
    // =========================================================================
    #[error("Duplicate correlation id: {correlation_id}, an aggregation is already running")]
    DuplicateCorrelationId { correlation_id: String },

    #[error("Missing correlation id in signal headers")]
    MissingCorrelationId,

    #[error("Correlation id too long: {length} bytes exceeds limit of {limit} bytes")]
    CorrelationIdTooLong { length: usize, limit: usize },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid acknowledgement label: {label}, reason: {reason}")]
    InvalidAckLabel { label: String, reason: String },

    #[error("Acknowledgement label too long: {length} bytes exceeds limit of {limit} bytes")]
    AckLabelTooLong { length: usize, limit: usize },

    #[error("Too many acknowledgement requests: {count} exceeds limit of {limit}")]
    TooManyAckRequests { count: usize, limit: usize },

    #[error("Invalid entity id: {entity_id}, reason: {reason}")]
    InvalidEntityId { entity_id: String, reason: String },

    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Aggregation session closed: {correlation_id}")]
    SessionClosed { correlation_id: String },

    #[error("Forwarder closed: {correlation_id}")]
    ForwarderClosed { correlation_id: String },

    #[error("Session capacity reached: {count} sessions, limit: {limit}")]
    SessionCapacityReached { count: usize, limit: usize },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {field}, reason: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {reason}")]
    Internal { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a duplicate correlation id error
    pub fn duplicate_correlation_id(correlation_id: impl Into<String>) -> Self {
        Self::DuplicateCorrelationId {
            correlation_id: correlation_id.into(),
        }
    }

    /// Create an invalid acknowledgement label error
    pub fn invalid_ack_label(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAckLabel {
            label: label.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Check if this error is a synchronous start rejection
    ///
    /// Start rejections are surfaced to the caller of a start operation and
    /// never travel through a completion callback. They are fatal to the new
    /// request only; in-flight sessions are left untouched.
    pub fn is_start_rejection(&self) -> bool {
        matches!(
            self,
            Self::DuplicateCorrelationId { .. }
                | Self::MissingCorrelationId
                | Self::CorrelationIdTooLong { .. }
                | Self::InvalidAckLabel { .. }
                | Self::AckLabelTooLong { .. }
                | Self::TooManyAckRequests { .. }
                | Self::InvalidEntityId { .. }
                | Self::SessionCapacityReached { .. }
        )
    }
}
