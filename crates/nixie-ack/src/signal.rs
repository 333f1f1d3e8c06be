//! Signal and response types consumed from the command layer
//!
//! The aggregation core only needs the slice of a signal the command layer
//! exposes: an entity id plus the opaque header bag carrying correlation id,
//! requested acknowledgements, and timeout.

use crate::label::{AckLabel, AckRequest};
use nixie_core::entity::EntityId;
use nixie_core::error::Result;
use nixie_core::headers::Headers;
use nixie_core::status::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// A client-initiated modification signal, as seen by the aggregation core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    entity_id: EntityId,
    headers: Headers,
}

impl Signal {
    /// Create a signal for an entity with the given headers
    pub fn new(entity_id: EntityId, headers: Headers) -> Self {
        Self { entity_id, headers }
    }

    /// Get the targeted entity
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Get the headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the correlation id, if present and non-empty
    pub fn correlation_id(&self) -> Option<&str> {
        self.headers.correlation_id()
    }

    /// Get the explicitly requested timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.headers.timeout()
    }

    /// Compute the effective acknowledgement request set
    ///
    /// When the requested-acks header is absent and the caller expects a
    /// response, the built-in persisted label is requested implicitly. An
    /// explicitly empty list is an opt-out and stays empty.
    ///
    /// # Errors
    /// Returns error if any requested label is invalid.
    pub fn effective_ack_requests(&self) -> Result<Vec<AckRequest>> {
        match self.headers.requested_acks() {
            Some(raw) => raw.iter().map(|label| AckRequest::parse(label)).collect(),
            None if self.headers.is_response_required() => {
                Ok(vec![AckRequest::new(AckLabel::persisted())])
            }
            None => Ok(Vec::new()),
        }
    }
}

/// The direct domain response to the original command
///
/// Distinct from out-of-band acknowledgements; when an aggregation succeeds
/// and only the built-in persisted label was requested, this is what the
/// caller receives verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    entity_id: EntityId,
    status: StatusCode,
    headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl Response {
    /// Create a response
    pub fn new(
        entity_id: EntityId,
        status: StatusCode,
        headers: Headers,
        payload: Option<Value>,
    ) -> Self {
        Self {
            entity_id,
            status,
            headers,
            payload,
        }
    }

    /// Get the entity the response is about
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Get the status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the optional payload
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> EntityId {
        EntityId::new("thing", "1").unwrap()
    }

    #[test]
    fn test_explicit_requests_are_parsed() {
        let signal = Signal::new(
            entity(),
            Headers::new()
                .with_correlation_id("req-1")
                .with_requested_acks(["persisted", "custom-a"]),
        );
        let requests = signal.effective_ack_requests().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].label().as_str(), "custom-a");
    }

    #[test]
    fn test_absent_requests_inject_persisted() {
        let signal = Signal::new(entity(), Headers::new().with_correlation_id("req-1"));
        let requests = signal.effective_ack_requests().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].label().is_persisted());
    }

    #[test]
    fn test_empty_requests_opt_out() {
        let signal = Signal::new(
            entity(),
            Headers::new()
                .with_correlation_id("req-1")
                .with_requested_acks(Vec::<String>::new()),
        );
        assert!(signal.effective_ack_requests().unwrap().is_empty());
    }

    #[test]
    fn test_no_response_required_means_no_implicit_request() {
        let signal = Signal::new(
            entity(),
            Headers::new()
                .with_correlation_id("req-1")
                .with_response_required(false),
        );
        assert!(signal.effective_ack_requests().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_label_is_rejected() {
        let signal = Signal::new(
            entity(),
            Headers::new()
                .with_correlation_id("req-1")
                .with_requested_acks(["has space"]),
        );
        assert!(signal.effective_ack_requests().is_err());
    }
}
