// system-tests/src/telemetry.rs
// ============================================================================
// Module: Test Telemetry
// Description: Tracing subscriber setup for test processes.
// Purpose: Route lifecycle events to the test harness output.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! Installs one global `fmt` subscriber per process, filtered by `RUST_LOG`
//! (default `info`) and written through the test writer so output is
//! captured per test.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info";

/// Initializes test logging. Safe to call repeatedly; only the first call
/// installs a subscriber.
pub fn init_test_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
}
