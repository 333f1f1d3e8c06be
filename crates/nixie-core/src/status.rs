//! Status codes for acknowledgements and combined results
//!
//! TigerStyle: Own explicit type instead of pulling in an HTTP stack for a
//! handful of codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP-style status code carried by acknowledgements
///
/// Only the numeric value travels on the wire; the named constants below
/// cover the codes the aggregation core itself produces or inspects.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(u16);

impl StatusCode {
    /// 200 OK
    pub const OK: StatusCode = StatusCode(200);
    /// 201 Created
    pub const CREATED: StatusCode = StatusCode(201);
    /// 204 No Content
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    /// 400 Bad Request
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    /// 408 Request Timeout - the synthesized status of a pending label
    pub const REQUEST_TIMEOUT: StatusCode = StatusCode(408);
    /// 409 Conflict - carried by duplicate-correlation NACKs
    pub const CONFLICT: StatusCode = StatusCode(409);
    /// 424 Failed Dependency - the combined status of a partial failure
    pub const FAILED_DEPENDENCY: StatusCode = StatusCode(424);
    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    /// 503 Service Unavailable
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    /// Create a status code from its numeric value
    pub fn new(code: u16) -> Self {
        debug_assert!((100..=599).contains(&code), "status code out of range");
        Self(code)
    }

    /// Get the numeric value
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Check if this status is in the 2xx success range
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.0)
    }

    /// Check if this status is in the 4xx client error range
    pub fn is_client_error(&self) -> bool {
        (400..=499).contains(&self.0)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<StatusCode> for u16 {
    fn from(status: StatusCode) -> Self {
        status.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(StatusCode::OK.is_success());
        assert!(StatusCode::NO_CONTENT.is_success());
        assert!(!StatusCode::REQUEST_TIMEOUT.is_success());
        assert!(!StatusCode::FAILED_DEPENDENCY.is_success());
    }

    #[test]
    fn test_client_error_range() {
        assert!(StatusCode::REQUEST_TIMEOUT.is_client_error());
        assert!(StatusCode::CONFLICT.is_client_error());
        assert!(!StatusCode::SERVICE_UNAVAILABLE.is_client_error());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&StatusCode::FAILED_DEPENDENCY).unwrap();
        assert_eq!(json, "424");
        let back: StatusCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StatusCode::FAILED_DEPENDENCY);
    }
}
