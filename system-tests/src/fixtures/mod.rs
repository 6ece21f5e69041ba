// system-tests/src/fixtures/mod.rs
// ============================================================================
// Module: Test Fixtures
// Description: Lifecycle fixtures shared by every conformance class.
// Purpose: Named locking, deferred cleanup, and resource naming.
// Dependencies: tokio, rand, tracing
// ============================================================================

//! ## Overview
//! Fixtures wrap the remote state a class touches: a named lock serializes
//! classes that mutate global defaults, a cleanup registry tears down what
//! a class or case created, and naming helpers keep resources unique.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cleanup;
pub mod lock;
pub mod naming;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use cleanup::CleanupError;
pub use cleanup::CleanupFailure;
pub use cleanup::CleanupHandle;
pub use cleanup::CleanupRegistry;
pub use cleanup::CleanupReport;
pub use lock::LockError;
pub use lock::LockGuard;
pub use lock::LockSettings;
pub use naming::rand_name;
pub use naming::rand_password;
