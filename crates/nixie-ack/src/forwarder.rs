//! Acknowledgement forwarder
//!
//! A transient per-request relay living where a signal entered the system.
//! Acknowledgements produced by topologically distant components arrive
//! here and are routed back to the original requester, which needs only the
//! stable correlation-derived name, not the session's location.

use crate::ack::Acknowledgement;
use crate::registry::NameReservation;
use crate::service::ServiceStats;
use nixie_core::error::{Error, Result};
use nixie_core::runtime::Runtime;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Result of attempting to start a forwarder
#[derive(Debug)]
pub enum StartedForwarder {
    /// The headers carried no acknowledgement requests; no relay is needed
    NotNeeded,
    /// A relay is running; deliver acknowledgements through the handle
    Started(ForwarderHandle),
}

impl StartedForwarder {
    /// Get the handle if a relay was started
    pub fn handle(&self) -> Option<&ForwarderHandle> {
        match self {
            StartedForwarder::NotNeeded => None,
            StartedForwarder::Started(handle) => Some(handle),
        }
    }
}

/// Inbound edge of a running forwarder
#[derive(Debug, Clone)]
pub struct ForwarderHandle {
    correlation_id: String,
    ack_tx: mpsc::Sender<Acknowledgement>,
}

impl ForwarderHandle {
    pub(crate) fn new(correlation_id: String, ack_tx: mpsc::Sender<Acknowledgement>) -> Self {
        Self {
            correlation_id,
            ack_tx,
        }
    }

    /// Get the correlation id this forwarder serves
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Hand an acknowledgement to the relay
    ///
    /// # Errors
    /// Returns `ForwarderClosed` if the relay already expired.
    pub async fn forward(&self, ack: Acknowledgement) -> Result<()> {
        self.ack_tx
            .send(ack)
            .await
            .map_err(|_| Error::ForwarderClosed {
                correlation_id: self.correlation_id.clone(),
            })
    }
}

/// The relay task: forwards until its fixed lifetime elapses
///
/// The lifetime is not an aggregation semantic - the owning session enforces
/// the authoritative timeout independently - so expiry here is silent.
pub(crate) struct AckForwarder<R: Runtime> {
    correlation_id: String,
    lifetime: Duration,
    ack_rx: mpsc::Receiver<Acknowledgement>,
    requester: mpsc::Sender<Acknowledgement>,
    runtime: R,
    reservation: NameReservation,
    stats: Arc<ServiceStats>,
}

impl<R: Runtime> AckForwarder<R> {
    pub(crate) fn new(
        correlation_id: String,
        lifetime: Duration,
        ack_rx: mpsc::Receiver<Acknowledgement>,
        requester: mpsc::Sender<Acknowledgement>,
        runtime: R,
        reservation: NameReservation,
        stats: Arc<ServiceStats>,
    ) -> Self {
        Self {
            correlation_id,
            lifetime,
            ack_rx,
            requester,
            runtime,
            reservation,
            stats,
        }
    }

    #[instrument(skip(self), fields(correlation_id = %self.correlation_id), level = "debug")]
    pub(crate) async fn run(self) {
        let Self {
            correlation_id: _,
            lifetime,
            mut ack_rx,
            requester,
            runtime,
            reservation,
            stats,
        } = self;

        debug!(lifetime_ms = lifetime.as_millis() as u64, "forwarder started");

        let mut deadline = runtime.sleep(lifetime);
        loop {
            tokio::select! {
                _ = &mut deadline => {
                    stats.forwarders_expired.fetch_add(1, Ordering::Relaxed);
                    debug!("forwarder lifetime elapsed");
                    break;
                }
                ack = ack_rx.recv() => match ack {
                    Some(ack) => {
                        if requester.send(ack).await.is_err() {
                            debug!("requester gone, stopping forwarder");
                            break;
                        }
                        stats.acks_forwarded.fetch_add(1, Ordering::Relaxed);
                    }
                    None => {
                        debug!("forwarder handle dropped");
                        break;
                    }
                },
            }
        }

        drop(reservation);
    }
}
