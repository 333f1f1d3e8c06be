//! Acknowledgement aggregator
//!
//! TigerStyle: Pure single-owner accumulator, no interior locking.
//!
//! The aggregator tracks, for one request, which labels are expected, which
//! have arrived, and the per-label status. It is deliberately not thread
//! safe: exactly one session owns it for its whole lifetime, and that
//! session serializes every mutation through its mailbox.

use crate::ack::{Acknowledgement, CombinedResult};
use crate::label::{AckLabel, AckRequest};
use nixie_core::entity::EntityId;
use nixie_core::headers::Headers;
use nixie_core::status::StatusCode;

/// State of one expected label
///
/// Every requested label starts as `Pending` holding the synthesized 408
/// placeholder, and flips to `Received` at most once. Whether a slot is
/// still pending is a structural fact, never inferred from the status code,
/// so a real 408 arrival fills its slot like any other.
#[derive(Debug, Clone)]
enum Slot {
    Pending(Acknowledgement),
    Received(Acknowledgement),
}

impl Slot {
    fn ack(&self) -> &Acknowledgement {
        match self {
            Slot::Pending(ack) | Slot::Received(ack) => ack,
        }
    }

    fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending(_))
    }
}

/// Result of offering a received acknowledgement to the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// The acknowledgement filled a pending slot
    Accepted,
    /// The label already holds a real acknowledgement; first write wins
    AlreadyReceived,
    /// The label was never requested; ignored without error
    Unsolicited,
}

/// Per-request accumulator of expected and received acknowledgements
///
/// Entries keep the order labels were first requested; that order is
/// preserved in the final combined result.
#[derive(Debug, Default)]
pub struct AckAggregator {
    entries: Vec<(AckLabel, Slot)>,
}

impl AckAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Register requested labels, pre-filling each with a timeout placeholder
    ///
    /// Idempotent per label: a label already holding a real acknowledgement
    /// is untouched; a label still pending gets a fresh placeholder (requests
    /// merged from multiple header sources re-add labels harmlessly).
    pub fn add_requests(&mut self, requests: &[AckRequest], entity_id: &EntityId, headers: &Headers) {
        for request in requests {
            let placeholder = Acknowledgement::timeout(
                request.label().clone(),
                entity_id.clone(),
                headers.clone(),
            );
            match self.slot_mut(request.label()) {
                Some(slot) if slot.is_pending() => *slot = Slot::Pending(placeholder),
                Some(_) => {}
                None => self
                    .entries
                    .push((request.label().clone(), Slot::Pending(placeholder))),
            }
        }
    }

    /// Offer a received acknowledgement
    ///
    /// A pending slot takes the value; anything else is ignored. Unsolicited
    /// labels never error (callers may log them).
    pub fn add_received(&mut self, ack: Acknowledgement) -> ReceiveOutcome {
        match self.slot_mut(ack.label()) {
            Some(slot) if slot.is_pending() => {
                *slot = Slot::Received(ack);
                ReceiveOutcome::Accepted
            }
            Some(_) => ReceiveOutcome::AlreadyReceived,
            None => ReceiveOutcome::Unsolicited,
        }
    }

    /// Check whether every expected label has received a real acknowledgement
    pub fn all_received(&self) -> bool {
        self.entries.iter().all(|(_, slot)| !slot.is_pending())
    }

    /// Check whether the aggregation fully succeeded
    ///
    /// True iff everything arrived and every status is in the 2xx range.
    pub fn is_successful(&self) -> bool {
        self.all_received()
            && self
                .entries
                .iter()
                .all(|(_, slot)| slot.ack().status().is_success())
    }

    /// Number of expected labels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no labels are expected
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether the built-in persisted label is the only one requested
    pub fn only_persisted_requested(&self) -> bool {
        self.entries.len() == 1 && self.entries[0].0.is_persisted()
    }

    /// Iterate over the requested labels in request order
    pub fn requested_labels(&self) -> impl Iterator<Item = &AckLabel> {
        self.entries.iter().map(|(label, _)| label)
    }

    /// Consume the aggregator into the combined result
    ///
    /// Combine rule: a single entry passes its own status through verbatim;
    /// multiple entries combine to 200 iff all succeeded, 424 otherwise.
    pub fn build_combined(self, entity_id: &EntityId, headers: &Headers) -> CombinedResult {
        debug_assert!(!self.entries.is_empty(), "expected set must not be empty");

        let status = if self.entries.len() == 1 {
            self.entries[0].1.ack().status()
        } else if self
            .entries
            .iter()
            .all(|(_, slot)| slot.ack().status().is_success())
        {
            StatusCode::OK
        } else {
            StatusCode::FAILED_DEPENDENCY
        };

        let acknowledgements = self
            .entries
            .into_iter()
            .map(|(_, slot)| match slot {
                Slot::Pending(ack) | Slot::Received(ack) => ack,
            })
            .collect();

        CombinedResult::new(entity_id.clone(), status, acknowledgements, headers.clone())
    }

    fn slot_mut(&mut self, label: &AckLabel) -> Option<&mut Slot> {
        self.entries
            .iter_mut()
            .find(|(l, _)| l == label)
            .map(|(_, slot)| slot)
    }
}
