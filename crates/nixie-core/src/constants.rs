//! TigerStyle constants for Nixie
//!
//! All limits are explicit, use big-endian naming (most significant first),
//! and include units in the name.

// =============================================================================
// Entity Limits
// =============================================================================

/// Maximum length of an entity namespace in bytes
pub const ENTITY_NAMESPACE_LENGTH_BYTES_MAX: usize = 128;

/// Maximum length of an entity name in bytes
pub const ENTITY_NAME_LENGTH_BYTES_MAX: usize = 256;

// =============================================================================
// Acknowledgement Limits
// =============================================================================

/// Maximum length of an acknowledgement label in bytes
pub const ACK_LABEL_LENGTH_BYTES_MAX: usize = 100;

/// Maximum number of acknowledgement requests per signal
pub const ACK_REQUESTS_COUNT_MAX: usize = 100;

/// Maximum length of a correlation id in bytes
pub const CORRELATION_ID_LENGTH_BYTES_MAX: usize = 256;

// =============================================================================
// Aggregation Limits
// =============================================================================

/// Default aggregation timeout when the signal carries none (10 sec)
pub const AGGREGATION_TIMEOUT_MS_DEFAULT: u64 = 10 * 1000;

/// Maximum aggregation timeout a signal may request (1 min)
///
/// Larger requested timeouts are clamped, never rejected.
pub const AGGREGATION_TIMEOUT_MS_MAX: u64 = 60 * 1000;

/// Default depth of a session's event mailbox
pub const SESSION_MAILBOX_DEPTH_DEFAULT: usize = 64;

/// Maximum depth of a session's event mailbox
pub const SESSION_MAILBOX_DEPTH_MAX: usize = 1024;

/// Maximum number of concurrently in-flight aggregation sessions
pub const SESSIONS_CONCURRENT_COUNT_MAX: usize = 1_000_000;

// =============================================================================
// Forwarder Limits
// =============================================================================

/// Default forwarder lifetime (2 min)
///
/// Fixed deadline from start, sized to outlive the session's authoritative
/// timeout; the forwarder never enforces aggregation semantics itself.
pub const FORWARDER_LIFETIME_MS_DEFAULT: u64 = 2 * 60 * 1000;

/// Maximum forwarder lifetime (10 min)
pub const FORWARDER_LIFETIME_MS_MAX: u64 = 10 * 60 * 1000;

// =============================================================================
// Correlation-Derived Names
// =============================================================================

/// Name prefix for aggregation sessions (prefix + correlation id)
pub const AGGREGATOR_NAME_PREFIX: &str = "ackagg-";

/// Name prefix for acknowledgement forwarders (prefix + correlation id)
pub const FORWARDER_NAME_PREFIX: &str = "ackfwd-";

// Compile-time assertions for constant validity
const _: () = {
    assert!(ACK_LABEL_LENGTH_BYTES_MAX >= 8);
    assert!(AGGREGATION_TIMEOUT_MS_DEFAULT <= AGGREGATION_TIMEOUT_MS_MAX);
    assert!(FORWARDER_LIFETIME_MS_DEFAULT > AGGREGATION_TIMEOUT_MS_MAX);
    assert!(FORWARDER_LIFETIME_MS_DEFAULT <= FORWARDER_LIFETIME_MS_MAX);
    assert!(SESSION_MAILBOX_DEPTH_DEFAULT <= SESSION_MAILBOX_DEPTH_MAX);
    assert!(!AGGREGATOR_NAME_PREFIX.is_empty());
    assert!(!FORWARDER_NAME_PREFIX.is_empty());
};
