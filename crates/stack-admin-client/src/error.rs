// crates/stack-admin-client/src/error.rs
// ============================================================================
// Module: Admin Client Errors
// Description: Error taxonomy for compute and identity admin API calls.
// Purpose: Give callers a stable error surface with status inspection.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every client operation returns [`ClientError`]. Non-success HTTP statuses
//! are preserved with the response body so test failures stay diagnosable.
//! Invariants:
//! - No call is retried; a single failure surfaces as a single error.
//! - [`ClientError::status`] is `Some` only for [`ClientError::Status`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Client Errors
// ============================================================================

/// Errors returned by the admin API clients.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Endpoint URL could not be parsed or extended.
    #[error("invalid endpoint {url}: {reason}")]
    InvalidEndpoint {
        /// Endpoint URL as provided.
        url: String,
        /// Parse or join failure reason.
        reason: String,
    },
    /// Client configuration was rejected before any request was sent.
    #[error("client configuration error: {0}")]
    Config(String),
    /// Request could not be sent or the response could not be read.
    #[error("http transport failure for {method} {url}: {message}")]
    Transport {
        /// HTTP method.
        method: String,
        /// Request URL.
        url: String,
        /// Transport error message.
        message: String,
    },
    /// Service responded with a non-success status.
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        /// HTTP method.
        method: String,
        /// Request URL.
        url: String,
        /// Response status code.
        status: u16,
        /// Response body (may be empty).
        body: String,
    },
    /// Request body could not be serialized.
    #[error("failed to encode {context} request: {message}")]
    Encode {
        /// Envelope being encoded.
        context: String,
        /// Serializer error message.
        message: String,
    },
    /// Response body did not match the expected envelope.
    #[error("failed to decode {context}: {message}")]
    Decode {
        /// Envelope or payload being decoded.
        context: String,
        /// Decoder error message.
        message: String,
    },
}

impl ClientError {
    /// Returns the HTTP status code for status errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status {
                status, ..
            } => Some(*status),
            _ => None,
        }
    }

    /// Returns true when the service reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }
}
