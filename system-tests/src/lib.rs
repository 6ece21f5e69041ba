// system-tests/src/lib.rs
// ============================================================================
// Module: Stack Admin System Tests Library
// Description: Fixture lifecycle, configuration, and reporting for suites.
// Purpose: Provide the shared runtime for the admin API conformance suites.
// Dependencies: stack-admin-client, tokio, tracing
// ============================================================================

//! ## Overview
//! This crate hosts the pieces every conformance class shares: environment
//! configuration, the named lock and cleanup registry fixtures, the class
//! runner, and the artifact reporter. The suites themselves live under
//! `system-tests/tests`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assertions;
pub mod config;
pub mod fixtures;
pub mod report;
pub mod runner;
pub mod telemetry;

// ============================================================================
// SECTION: Tests
// ============================================================================
