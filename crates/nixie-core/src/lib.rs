//! Nixie Core
//!
//! Core types, errors, and constants for the Nixie twin platform.
//!
//! # Overview
//!
//! Nixie is a distributed IoT-twin platform. This crate carries the
//! cross-cutting foundation its subsystems share: the error taxonomy,
//! explicit limit constants, configuration, entity/status/header types,
//! and the async runtime abstraction.
//!
//! # TigerStyle
//!
//! This crate follows [TigerStyle](https://github.com/tigerbeetle/tigerbeetle/blob/main/docs/TIGER_STYLE.md)
//! engineering principles:
//! - Safety > Performance > Developer Experience
//! - Explicit limits with big-endian naming (e.g., `ACK_LABEL_LENGTH_BYTES_MAX`)
//! - Explicit validation at construction boundaries

pub mod config;
pub mod constants;
pub mod entity;
pub mod error;
pub mod headers;
pub mod runtime;
pub mod status;
pub mod telemetry;

pub use config::{AggregationConfig, ForwarderConfig, NixieConfig};
pub use constants::*;
pub use entity::EntityId;
pub use error::{Error, Result};
pub use headers::{
    Headers, HEADER_CORRELATION_ID, HEADER_REQUESTED_ACKS, HEADER_RESPONSE_REQUIRED, HEADER_TIMEOUT,
};
pub use runtime::{current_runtime, CurrentRuntime, Instant, JoinError, JoinHandle, Runtime, TokioRuntime};
pub use status::StatusCode;
pub use telemetry::{init_telemetry, TelemetryConfig};
