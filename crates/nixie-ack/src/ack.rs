//! Acknowledgement and combined-result types

use crate::label::AckLabel;
use nixie_core::entity::EntityId;
use nixie_core::headers::Headers;
use nixie_core::status::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One reported outcome for one requested label of one request
///
/// Real acknowledgements arrive from elsewhere in the platform; the
/// synthesized variants (`timeout`, `negative`) are produced locally by the
/// aggregation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    label: AckLabel,
    entity_id: EntityId,
    status: StatusCode,
    headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl Acknowledgement {
    /// Create a received acknowledgement
    pub fn new(
        label: AckLabel,
        entity_id: EntityId,
        status: StatusCode,
        headers: Headers,
        payload: Option<Value>,
    ) -> Self {
        Self {
            label,
            entity_id,
            status,
            headers,
            payload,
        }
    }

    /// Create the timeout placeholder pre-filled for a requested label
    ///
    /// Carries 408 so a request that never sees an arrival reports timeout
    /// rather than silently succeeding.
    pub fn timeout(label: AckLabel, entity_id: EntityId, headers: Headers) -> Self {
        Self {
            label,
            entity_id,
            status: StatusCode::REQUEST_TIMEOUT,
            headers,
            payload: None,
        }
    }

    /// Create the negative acknowledgement sent when a correlation id is
    /// already in use
    pub fn negative(
        label: AckLabel,
        entity_id: EntityId,
        headers: Headers,
        correlation_id: &str,
    ) -> Self {
        let payload = serde_json::json!({
            "error": "acknowledgements:correlation-id.duplicate",
            "message": format!(
                "An acknowledgement aggregation is already running for correlation id '{}'.",
                correlation_id
            ),
        });
        Self {
            label,
            entity_id,
            status: StatusCode::CONFLICT,
            headers,
            payload: Some(payload),
        }
    }

    /// Get the label this acknowledgement answers
    pub fn label(&self) -> &AckLabel {
        &self.label
    }

    /// Get the entity this acknowledgement is about
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

/// The single aggregated outcome computed from all labels' individual
/// outcomes
///
/// Derived once at completion and never mutated. The acknowledgement list
/// preserves the order labels were first requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    entity_id: EntityId,
    status: StatusCode,
    acknowledgements: Vec<Acknowledgement>,
    headers: Headers,
}

impl CombinedResult {
    pub(crate) fn new(
        entity_id: EntityId,
        status: StatusCode,
        acknowledgements: Vec<Acknowledgement>,
        headers: Headers,
    ) -> Self {
        debug_assert!(!acknowledgements.is_empty(), "combined result must cover at least one label");
        Self {
            entity_id,
            status,
            acknowledgements,
            headers,
        }
    }

    /// Get the entity the aggregation was about
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Get the combined status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the per-label acknowledgements in request order
    pub fn acknowledgements(&self) -> &[Acknowledgement] {
        &self.acknowledgements
    }

    /// Look up the acknowledgement for one label
    pub fn acknowledgement(&self, label: &AckLabel) -> Option<&Acknowledgement> {
        self.acknowledgements.iter().find(|ack| ack.label() == label)
    }

    /// Get the headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}
