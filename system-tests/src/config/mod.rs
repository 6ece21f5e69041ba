// system-tests/src/config/mod.rs
// ============================================================================
// Module: System Test Configuration
// Description: Centralized configuration for the admin API conformance suites.
// Purpose: Provide typed access to test environment settings and defaults.
// Dependencies: std
// ============================================================================

//! ## Overview
//! System-test configuration is read from environment variables and mapped into
//! a small typed structure for reuse across the runner and test helpers.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::DEFAULT_LOCK_TIMEOUT;
pub use env::DEFAULT_RESOURCE_PREFIX;
pub use env::LiveTarget;
pub use env::SystemTestConfig;
pub use env::SystemTestEnv;
pub use env::read_env_strict;
