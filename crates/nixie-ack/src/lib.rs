//! Nixie Acknowledgement Aggregation
//!
//! Collects, correlates, and times out the asynchronous acknowledgements of
//! one client-initiated modification request before answering the caller.
//!
//! # Overview
//!
//! A signal requesting N acknowledgement labels starts one
//! [`AggregationSession`](session) after reserving its correlation id in the
//! [`CorrelationRegistry`](registry). Zero or more forwarder relays route
//! externally produced acknowledgements to it. The session updates its
//! [`AckAggregator`](aggregator) on every arrival, or times out, and emits
//! exactly one terminal outcome: the synthesized combined result, or the
//! verbatim domain response when only the built-in persisted label was in
//! play and everything succeeded.
//!
//! # TigerStyle
//! - One task per in-flight correlation id, no shared mutable state between
//!   sessions
//! - Bounded mailboxes, fixed deadlines armed at start
//! - Start failures surface synchronously; a running session never fails,
//!   it answers exactly once

pub mod ack;
pub mod aggregator;
pub mod forwarder;
pub mod label;
pub mod registry;
pub mod service;
pub mod session;
pub mod signal;

pub use ack::{Acknowledgement, CombinedResult};
pub use aggregator::{AckAggregator, ReceiveOutcome};
pub use forwarder::{ForwarderHandle, StartedForwarder};
pub use label::{AckLabel, AckRequest};
pub use registry::{CorrelationRegistry, NameReservation};
pub use service::{AggregationService, ServiceStats, StartedAggregation};
pub use session::{Outcome, SessionHandle};
pub use signal::{Response, Signal};
