//! Aggregation service
//!
//! The public entry point of the subsystem: validates a signal, reserves its
//! correlation id, and spawns the session/forwarder tasks. Start failures
//! are returned synchronously from these methods; once a session is running
//! its only output is the single terminal outcome through the completion
//! callback.

use crate::ack::Acknowledgement;
use crate::aggregator::AckAggregator;
use crate::forwarder::{AckForwarder, ForwarderHandle, StartedForwarder};
use crate::label::AckRequest;
use crate::registry::CorrelationRegistry;
use crate::session::{AggregationSession, Outcome, SessionHandle};
use crate::signal::Signal;
use nixie_core::config::NixieConfig;
use nixie_core::constants::{ACK_REQUESTS_COUNT_MAX, AGGREGATION_TIMEOUT_MS_MAX};
use nixie_core::entity::EntityId;
use nixie_core::error::{Error, Result};
use nixie_core::headers::Headers;
use nixie_core::runtime::Runtime;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Result of attempting to start an aggregation
#[derive(Debug)]
pub enum StartedAggregation {
    /// The effective request set is empty; the caller needs no aggregation
    NotNeeded,
    /// A session is running; deliver events through the handle
    Started(SessionHandle),
}

impl StartedAggregation {
    /// Get the handle if a session was started
    pub fn handle(&self) -> Option<&SessionHandle> {
        match self {
            StartedAggregation::NotNeeded => None,
            StartedAggregation::Started(handle) => Some(handle),
        }
    }
}

/// Monotonic counters for service activity
///
/// Plain atomics; wrap-around is acceptable for counters.
#[derive(Debug, Default)]
pub struct ServiceStats {
    pub(crate) sessions_started: AtomicU64,
    pub(crate) sessions_completed: AtomicU64,
    pub(crate) sessions_timed_out: AtomicU64,
    pub(crate) forwarders_started: AtomicU64,
    pub(crate) forwarders_expired: AtomicU64,
    pub(crate) acks_forwarded: AtomicU64,
}

impl ServiceStats {
    /// Total sessions started
    pub fn sessions_started(&self) -> u64 {
        self.sessions_started.load(Ordering::Relaxed)
    }

    /// Total sessions that emitted their terminal outcome
    pub fn sessions_completed(&self) -> u64 {
        self.sessions_completed.load(Ordering::Relaxed)
    }

    /// Total sessions whose deadline fired
    pub fn sessions_timed_out(&self) -> u64 {
        self.sessions_timed_out.load(Ordering::Relaxed)
    }

    /// Total forwarders started
    pub fn forwarders_started(&self) -> u64 {
        self.forwarders_started.load(Ordering::Relaxed)
    }

    /// Total forwarders that reached their lifetime
    pub fn forwarders_expired(&self) -> u64 {
        self.forwarders_expired.load(Ordering::Relaxed)
    }

    /// Total acknowledgements relayed to requesters
    pub fn acks_forwarded(&self) -> u64 {
        self.acks_forwarded.load(Ordering::Relaxed)
    }
}

/// Acknowledgement aggregation service
///
/// Owns the correlation registry and configuration; cheap to share behind an
/// `Arc`. One logical task per in-flight correlation id, no shared mutable
/// state across sessions.
pub struct AggregationService<R: Runtime> {
    config: NixieConfig,
    registry: CorrelationRegistry,
    runtime: R,
    stats: Arc<ServiceStats>,
}

impl<R: Runtime + 'static> AggregationService<R> {
    /// Create a new service with validated configuration
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the config is unusable.
    pub fn new(config: NixieConfig, runtime: R) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            registry: CorrelationRegistry::new(),
            runtime,
            stats: Arc::new(ServiceStats::default()),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &NixieConfig {
        &self.config
    }

    /// Get the correlation registry
    pub fn registry(&self) -> &CorrelationRegistry {
        &self.registry
    }

    /// Get the activity counters
    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }

    /// Number of currently in-flight aggregation sessions
    pub fn active_aggregations(&self) -> usize {
        self.registry.active_aggregations()
    }

    /// Start an aggregation session for a signal
    ///
    /// Returns `NotNeeded` when the effective request set is empty (common
    /// case, cheap). Otherwise reserves the correlation id, pre-fills the
    /// aggregator with timeout placeholders, arms the deadline, and spawns
    /// the session task. `on_complete` receives exactly one terminal
    /// outcome.
    ///
    /// # Errors
    /// Returns `MissingCorrelationId`, `DuplicateCorrelationId`, label
    /// validation errors, or `SessionCapacityReached`; all synchronously,
    /// never through the callback. A rejected start leaves any in-flight
    /// session for the same correlation id untouched.
    pub fn start_aggregation<F>(&self, signal: Signal, on_complete: F) -> Result<StartedAggregation>
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let requests = signal.effective_ack_requests()?;
        if requests.is_empty() {
            debug!(entity_id = %signal.entity_id(), "no acknowledgements requested, aggregation not needed");
            return Ok(StartedAggregation::NotNeeded);
        }

        if requests.len() > ACK_REQUESTS_COUNT_MAX {
            return Err(Error::TooManyAckRequests {
                count: requests.len(),
                limit: ACK_REQUESTS_COUNT_MAX,
            });
        }

        let active = self.registry.active_aggregations();
        if active >= self.config.aggregation.max_sessions_count {
            return Err(Error::SessionCapacityReached {
                count: active,
                limit: self.config.aggregation.max_sessions_count,
            });
        }

        let correlation_id = signal
            .correlation_id()
            .ok_or(Error::MissingCorrelationId)?
            .to_string();
        let reservation = self.registry.reserve_aggregator(&correlation_id)?;

        let mut aggregator = AckAggregator::new();
        aggregator.add_requests(&requests, signal.entity_id(), signal.headers());

        let timeout = self.effective_timeout(signal.timeout());
        let (event_tx, event_rx) = mpsc::channel(self.config.aggregation.mailbox_depth);

        let session = AggregationSession::new(
            correlation_id.clone(),
            signal.entity_id().clone(),
            signal.headers().clone(),
            aggregator,
            timeout,
            event_rx,
            self.runtime.clone(),
            reservation,
            Arc::clone(&self.stats),
        );

        self.stats.sessions_started.fetch_add(1, Ordering::Relaxed);
        let _task = self.runtime.spawn(session.run(Box::new(on_complete)));

        Ok(StartedAggregation::Started(SessionHandle::new(
            correlation_id,
            event_tx,
        )))
    }

    /// Start a forwarder relay for acknowledgements entering at this point
    ///
    /// Returns `NotNeeded` when the headers carry no acknowledgement
    /// requests. On a name collision no relay is started: a negative
    /// acknowledgement is sent to the requester for every non-built-in
    /// requested label (the built-in persisted label is handled by the
    /// session directly) and `DuplicateCorrelationId` is returned.
    ///
    /// # Errors
    /// Returns `MissingCorrelationId`, `DuplicateCorrelationId`, or label
    /// validation errors.
    pub fn start_forwarder(
        &self,
        entity_id: EntityId,
        headers: Headers,
        requester: mpsc::Sender<Acknowledgement>,
    ) -> Result<StartedForwarder> {
        let raw = headers.requested_acks().unwrap_or_default();
        if raw.is_empty() {
            return Ok(StartedForwarder::NotNeeded);
        }

        let requests: Vec<AckRequest> = raw
            .iter()
            .map(|label| AckRequest::parse(label))
            .collect::<Result<_>>()?;

        let correlation_id = headers
            .correlation_id()
            .ok_or(Error::MissingCorrelationId)?
            .to_string();

        match self.registry.reserve_forwarder(&correlation_id) {
            Ok(reservation) => {
                let (ack_tx, ack_rx) = mpsc::channel(self.config.aggregation.mailbox_depth);

                let forwarder = AckForwarder::new(
                    correlation_id.clone(),
                    Duration::from_millis(self.config.forwarder.lifetime_ms),
                    ack_rx,
                    requester,
                    self.runtime.clone(),
                    reservation,
                    Arc::clone(&self.stats),
                );

                self.stats.forwarders_started.fetch_add(1, Ordering::Relaxed);
                let _task = self.runtime.spawn(forwarder.run());

                Ok(StartedForwarder::Started(ForwarderHandle::new(
                    correlation_id,
                    ack_tx,
                )))
            }
            Err(err @ Error::DuplicateCorrelationId { .. }) => {
                warn!(
                    correlation_id = %correlation_id,
                    "forwarder name collision, sending negative acknowledgements"
                );
                for request in &requests {
                    if request.label().is_persisted() {
                        continue;
                    }
                    let nack = Acknowledgement::negative(
                        request.label().clone(),
                        entity_id.clone(),
                        headers.clone(),
                        &correlation_id,
                    );
                    if requester.try_send(nack).is_err() {
                        debug!(label = %request.label(), "requester unavailable for negative acknowledgement");
                    }
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Resolve the deadline for a session: the signal's explicit timeout
    /// clamped to the maximum, or the configured fallback
    fn effective_timeout(&self, requested: Option<Duration>) -> Duration {
        let max = Duration::from_millis(AGGREGATION_TIMEOUT_MS_MAX);
        match requested {
            Some(timeout) if timeout > max => {
                debug!(
                    requested_ms = timeout.as_millis() as u64,
                    clamped_ms = max.as_millis() as u64,
                    "requested timeout clamped"
                );
                max
            }
            Some(timeout) => timeout,
            None => Duration::from_millis(self.config.aggregation.fallback_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nixie_core::runtime::TokioRuntime;

    fn service() -> AggregationService<TokioRuntime> {
        AggregationService::new(NixieConfig::default(), TokioRuntime).unwrap()
    }

    fn entity() -> EntityId {
        EntityId::new("thing", "1").unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = NixieConfig::default();
        config.aggregation.mailbox_depth = 0;
        assert!(AggregationService::new(config, TokioRuntime).is_err());
    }

    #[tokio::test]
    async fn test_no_aggregation_needed_without_requests() {
        let service = service();
        let signal = Signal::new(
            entity(),
            Headers::new()
                .with_correlation_id("req-1")
                .with_response_required(false),
        );

        let started = service.start_aggregation(signal, |_| {}).unwrap();
        assert!(started.handle().is_none());
        assert_eq!(service.active_aggregations(), 0);
        assert_eq!(service.stats().sessions_started(), 0);
    }

    #[tokio::test]
    async fn test_missing_correlation_id_rejected_before_spawn() {
        let service = service();
        let signal = Signal::new(entity(), Headers::new());

        let err = service.start_aggregation(signal, |_| {}).unwrap_err();
        assert!(matches!(err, Error::MissingCorrelationId));
        assert!(err.is_start_rejection());
        assert_eq!(service.active_aggregations(), 0);
    }

    #[test]
    fn test_effective_timeout_clamps_and_falls_back() {
        let service = service();

        assert_eq!(
            service.effective_timeout(None),
            Duration::from_millis(service.config().aggregation.fallback_timeout_ms)
        );
        assert_eq!(
            service.effective_timeout(Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
        assert_eq!(
            service.effective_timeout(Some(Duration::from_secs(600))),
            Duration::from_millis(AGGREGATION_TIMEOUT_MS_MAX)
        );
    }

    #[tokio::test]
    async fn test_forwarder_not_needed_without_requests() {
        let service = service();
        let (requester, _rx) = mpsc::channel(8);

        let started = service
            .start_forwarder(entity(), Headers::new().with_correlation_id("req-1"), requester)
            .unwrap();
        assert!(started.handle().is_none());
        assert_eq!(service.stats().forwarders_started(), 0);
    }
}
