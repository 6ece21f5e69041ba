// system-tests/src/assertions.rs
// ============================================================================
// Module: Case Assertions
// Description: Fallible assertions for conformance case bodies.
// Purpose: Fail a case with a message instead of panicking mid-class.
// Dependencies: thiserror, stack-admin-client
// ============================================================================

//! ## Overview
//! Case bodies return [`CaseError`] rather than panic, so a failed
//! expectation still lets the case's cleanups and the class teardown run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use stack_admin_client::ClientError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a conformance case fails.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum CaseError {
    /// An expectation about the service response did not hold.
    #[error("assertion failed: {0}")]
    Assertion(String),
    /// An admin API call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// A cleanup could not be ordered.
    #[error(transparent)]
    Cleanup(#[from] crate::fixtures::CleanupError),
}

// ============================================================================
// SECTION: Assertions
// ============================================================================

/// Fails with `message` unless `condition` holds.
///
/// # Errors
///
/// Returns [`CaseError::Assertion`] when `condition` is false.
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), CaseError> {
    if condition { Ok(()) } else { Err(CaseError::Assertion(message.into())) }
}

/// Fails unless `actual == expected`.
///
/// # Errors
///
/// Returns [`CaseError::Assertion`] naming `what` and both values.
#[allow(clippy::use_debug, reason = "Mismatch messages render both values for diagnosis.")]
pub fn ensure_eq<T>(actual: &T, expected: &T, what: &str) -> Result<(), CaseError>
where
    T: PartialEq + fmt::Debug + ?Sized,
{
    if actual == expected {
        Ok(())
    } else {
        Err(CaseError::Assertion(format!("{what}: expected {expected:?}, got {actual:?}")))
    }
}

/// Fails unless the call was rejected as not found.
///
/// # Errors
///
/// Returns [`CaseError::Assertion`] when the call succeeded, and the client
/// error itself when it failed for another reason.
pub fn ensure_not_found<T>(result: Result<T, ClientError>, what: &str) -> Result<(), CaseError> {
    match result {
        Ok(_) => Err(CaseError::Assertion(format!("{what} still exists"))),
        Err(err) if err.is_not_found() => Ok(()),
        Err(err) => Err(CaseError::Client(err)),
    }
}
