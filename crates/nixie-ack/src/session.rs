//! Aggregation session
//!
//! One session task owns one aggregator for the lifetime of one request.
//! Every event for a correlation id is routed through the session's mailbox,
//! so the aggregator sees strictly ordered mutations without any locking;
//! sessions for different correlation ids run fully in parallel.

use crate::ack::{Acknowledgement, CombinedResult};
use crate::aggregator::{AckAggregator, ReceiveOutcome};
use crate::registry::NameReservation;
use crate::service::ServiceStats;
use crate::signal::Response;
use nixie_core::entity::EntityId;
use nixie_core::error::{Error, Result};
use nixie_core::headers::Headers;
use nixie_core::runtime::Runtime;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Events delivered to a session through its mailbox
#[derive(Debug)]
pub(crate) enum SessionEvent {
    /// An acknowledgement arrived for one requested label
    Ack(Acknowledgement),
    /// The direct domain response to the original command arrived
    Response(Response),
}

/// The single terminal answer of a session
///
/// Exactly one of these reaches the completion callback per started session.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The synthesized combined acknowledgement result
    Combined(CombinedResult),
    /// The verbatim domain response (fully successful, only the built-in
    /// persisted label requested)
    Response(Response),
}

/// Inbound edge of a running session
///
/// Cheap to clone; all clones feed the same mailbox. Sends apply
/// backpressure when the mailbox is full and fail once the session has
/// completed.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    correlation_id: String,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    pub(crate) fn new(correlation_id: String, event_tx: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            correlation_id,
            event_tx,
        }
    }

    /// Get the correlation id this session serves
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Deliver an acknowledgement to the session
    ///
    /// # Errors
    /// Returns `SessionClosed` if the session already completed.
    pub async fn ack(&self, ack: Acknowledgement) -> Result<()> {
        self.send(SessionEvent::Ack(ack)).await
    }

    /// Deliver the domain response to the session
    ///
    /// # Errors
    /// Returns `SessionClosed` if the session already completed.
    pub async fn respond(&self, response: Response) -> Result<()> {
        self.send(SessionEvent::Response(response)).await
    }

    async fn send(&self, event: SessionEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| Error::SessionClosed {
                correlation_id: self.correlation_id.clone(),
            })
    }
}

/// One in-flight aggregation: owns the aggregator, the mailbox receiver,
/// the fixed deadline, and the correlation-id name reservation
pub(crate) struct AggregationSession<R: Runtime> {
    correlation_id: String,
    entity_id: EntityId,
    headers: Headers,
    aggregator: AckAggregator,
    timeout: Duration,
    event_rx: mpsc::Receiver<SessionEvent>,
    runtime: R,
    reservation: NameReservation,
    stats: Arc<ServiceStats>,
}

impl<R: Runtime> AggregationSession<R> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        correlation_id: String,
        entity_id: EntityId,
        headers: Headers,
        aggregator: AckAggregator,
        timeout: Duration,
        event_rx: mpsc::Receiver<SessionEvent>,
        runtime: R,
        reservation: NameReservation,
        stats: Arc<ServiceStats>,
    ) -> Self {
        debug_assert!(!aggregator.is_empty(), "session needs at least one expected label");

        Self {
            correlation_id,
            entity_id,
            headers,
            aggregator,
            timeout,
            event_rx,
            runtime,
            reservation,
            stats,
        }
    }

    /// Run the session to its single terminal outcome
    ///
    /// The deadline is fixed at start and never extended by traffic. The
    /// session ends when every expected acknowledgement arrived (plus, when
    /// only the built-in persisted label is in play, the domain response) or
    /// when the deadline fires, whichever comes first. A fired deadline is a
    /// degraded result, not an error.
    #[instrument(
        skip(self, on_complete),
        fields(correlation_id = %self.correlation_id, entity_id = %self.entity_id),
        level = "debug"
    )]
    pub(crate) async fn run(self, on_complete: Box<dyn FnOnce(Outcome) + Send>) {
        let Self {
            correlation_id,
            entity_id,
            headers,
            mut aggregator,
            timeout,
            mut event_rx,
            runtime,
            reservation,
            stats,
        } = self;

        info!(
            timeout_ms = timeout.as_millis() as u64,
            labels = aggregator.len(),
            "aggregation session started"
        );

        let mut response: Option<Response> = None;
        let mut inbox_open = true;

        let timed_out = {
            let mut deadline = runtime.sleep(timeout);
            loop {
                tokio::select! {
                    _ = &mut deadline => break true,
                    event = event_rx.recv(), if inbox_open => match event {
                        Some(SessionEvent::Ack(ack)) => {
                            match aggregator.add_received(ack) {
                                ReceiveOutcome::Accepted => {
                                    debug!(pending = !aggregator.all_received(), "acknowledgement recorded");
                                }
                                ReceiveOutcome::AlreadyReceived => {
                                    debug!("duplicate acknowledgement ignored");
                                }
                                ReceiveOutcome::Unsolicited => {
                                    warn!("unsolicited acknowledgement ignored");
                                }
                            }
                            if ready_to_complete(&aggregator, response.as_ref()) {
                                break false;
                            }
                        }
                        Some(SessionEvent::Response(r)) => {
                            debug!(status = r.status().as_u16(), "domain response recorded");
                            response = Some(r);
                            if ready_to_complete(&aggregator, response.as_ref()) {
                                break false;
                            }
                        }
                        // All handles dropped: nothing further can arrive,
                        // only the deadline can end the wait.
                        None => inbox_open = false,
                    },
                }
            }
        };

        if timed_out {
            stats.sessions_timed_out.fetch_add(1, Ordering::Relaxed);
            if !aggregator.all_received() {
                let pending: Vec<&str> = aggregator
                    .requested_labels()
                    .map(|label| label.as_str())
                    .collect();
                warn!(?pending, "aggregation timed out with pending acknowledgements");
            }
        }

        let outcome = match response {
            Some(r) if aggregator.is_successful() && aggregator.only_persisted_requested() => {
                debug!("emitting domain response verbatim");
                Outcome::Response(r)
            }
            _ => {
                let combined = aggregator.build_combined(&entity_id, &headers);
                info!(status = combined.status().as_u16(), "aggregation completed");
                Outcome::Combined(combined)
            }
        };

        stats.sessions_completed.fetch_add(1, Ordering::Relaxed);
        on_complete(outcome);

        // Name released here; the correlation id becomes reusable only after
        // the terminal answer went out.
        drop(reservation);
    }
}

/// Completion check applied after every event
///
/// When only the built-in persisted label is requested and everything
/// succeeded so far, the session holds out for the domain response so the
/// caller gets the plain response shape; the deadline bounds the wait.
fn ready_to_complete(aggregator: &AckAggregator, response: Option<&Response>) -> bool {
    if !aggregator.all_received() {
        return false;
    }
    if aggregator.only_persisted_requested() && aggregator.is_successful() {
        return response.is_some();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{AckLabel, AckRequest};
    use nixie_core::status::StatusCode;

    fn entity() -> EntityId {
        EntityId::new("thing", "1").unwrap()
    }

    fn aggregator(labels: &[&str]) -> AckAggregator {
        let requests: Vec<AckRequest> = labels
            .iter()
            .map(|l| AckRequest::new(AckLabel::new(*l).unwrap()))
            .collect();
        let mut agg = AckAggregator::new();
        agg.add_requests(&requests, &entity(), &Headers::new());
        agg
    }

    fn ack(label: &str, status: StatusCode) -> Acknowledgement {
        Acknowledgement::new(
            AckLabel::new(label).unwrap(),
            entity(),
            status,
            Headers::new(),
            None,
        )
    }

    fn response() -> Response {
        Response::new(entity(), StatusCode::NO_CONTENT, Headers::new(), None)
    }

    #[test]
    fn test_not_ready_while_pending() {
        let agg = aggregator(&["persisted"]);
        assert!(!ready_to_complete(&agg, None));
        assert!(!ready_to_complete(&agg, Some(&response())));
    }

    #[test]
    fn test_persisted_only_waits_for_response() {
        let mut agg = aggregator(&["persisted"]);
        agg.add_received(ack("persisted", StatusCode::NO_CONTENT));

        assert!(!ready_to_complete(&agg, None));
        assert!(ready_to_complete(&agg, Some(&response())));
    }

    #[test]
    fn test_persisted_only_failure_completes_immediately() {
        let mut agg = aggregator(&["persisted"]);
        agg.add_received(ack("persisted", StatusCode::SERVICE_UNAVAILABLE));

        assert!(ready_to_complete(&agg, None));
    }

    #[test]
    fn test_multi_label_completes_without_response() {
        let mut agg = aggregator(&["persisted", "custom-a"]);
        agg.add_received(ack("persisted", StatusCode::NO_CONTENT));
        agg.add_received(ack("custom-a", StatusCode::OK));

        assert!(ready_to_complete(&agg, None));
    }
}
