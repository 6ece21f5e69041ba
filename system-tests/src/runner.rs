// system-tests/src/runner.rs
// ============================================================================
// Module: Class Runner
// Description: Lifecycle driver for one conformance test class.
// Purpose: Order lock, setup, cases, cleanup, report, and lock release.
// Dependencies: futures, tokio, tracing, uuid, stack-admin-client
// ============================================================================

//! ## Overview
//! A [`TestClass`] walks a class through its lifecycle:
//! begin, optional named lock, class setup registered into
//! [`TestClass::resources`], cases via [`TestClass::case`], then
//! [`TestClass::finish`]. Each case gets its own cleanup registry which is
//! drained right after the case body, whether the body passed, failed, or
//! panicked.
//! Invariants:
//! - Class cleanups run before the report is written; the lock is released
//!   after the report.
//! - A failed case never prevents later cases or any cleanup from running.
//! - Setup failures go through [`TestClass::abort`], which still drains
//!   class cleanups.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::io;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use stack_admin_client::Transcript;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::assertions::CaseError;
use crate::config::SystemTestConfig;
use crate::fixtures::CleanupRegistry;
use crate::fixtures::CleanupReport;
use crate::fixtures::LockError;
use crate::fixtures::LockGuard;
use crate::fixtures::LockSettings;
use crate::fixtures::lock;
use crate::report::CaseRecord;
use crate::report::CaseStatus;
use crate::report::ClassArtifacts;
use crate::report::ClassReporter;
use crate::report::ClassStatus;
use crate::report::ClassSummary;
use crate::telemetry::init_test_logging;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Artifact name for the recorded HTTP exchanges.
pub const TRANSCRIPT_ARTIFACT: &str = "http_transcript.json";

// ============================================================================
// SECTION: Cases
// ============================================================================

/// Identity of one conformance case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCase {
    /// Stable identifier, unchanged across renames.
    pub id: Uuid,
    /// Case name.
    pub name: &'static str,
}

impl TestCase {
    /// Creates a case identity.
    #[must_use]
    pub const fn new(id: Uuid, name: &'static str) -> Self {
        Self {
            id,
            name,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a class run fails.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ClassError {
    /// The named lock could not be acquired.
    #[error("class {class} could not acquire its lock: {source}")]
    Lock {
        /// Class name.
        class: String,
        /// Lock failure.
        #[source]
        source: LockError,
    },
    /// Class setup failed; no further cases ran.
    #[error("class {class} setup failed: {message}")]
    Setup {
        /// Class name.
        class: String,
        /// Setup failure message.
        message: String,
    },
    /// One or more cases failed.
    #[error("class {class}: failed cases: {}", .failed.join(", "))]
    CasesFailed {
        /// Class name.
        class: String,
        /// Names of the failed cases.
        failed: Vec<String>,
    },
    /// Every case passed but cleanups failed.
    #[error("class {class}: {count} cleanup action(s) failed")]
    Cleanup {
        /// Class name.
        class: String,
        /// Number of failed cleanups.
        count: usize,
    },
    /// Artifacts could not be written.
    #[error("class {class} report could not be written: {source}")]
    Report {
        /// Class name.
        class: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// SECTION: Test Class
// ============================================================================

/// One conformance class run.
#[derive(Debug)]
pub struct TestClass {
    /// Class name.
    name: String,
    /// Suite configuration.
    config: SystemTestConfig,
    /// Held named lock, if the class serializes.
    lock: Option<LockGuard>,
    /// Class-scoped cleanups.
    resources: CleanupRegistry,
    /// Summary writer.
    reporter: ClassReporter,
    /// HTTP exchanges to persist with the report.
    transcript: Option<Transcript>,
}

impl TestClass {
    /// Starts a class run and prepares its artifact directory.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::Report`] when the artifact root cannot be
    /// created.
    pub fn begin(name: &str, config: &SystemTestConfig) -> Result<Self, ClassError> {
        init_test_logging();
        let reporter = ClassReporter::new(name, config).map_err(|source| ClassError::Report {
            class: name.to_string(),
            source,
        })?;
        tracing::info!(class = name, live = config.is_live(), "class started");
        Ok(Self {
            name: name.to_string(),
            config: config.clone(),
            lock: None,
            resources: CleanupRegistry::new(name),
            reporter,
            transcript: None,
        })
    }

    /// Acquires the named lock for the rest of the class.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::Lock`] when the lock cannot be acquired within
    /// the configured timeout; the class summary is written as aborted.
    pub async fn lock(mut self, lock_name: &str) -> Result<Self, ClassError> {
        let settings = LockSettings::new(&self.config.lock_dir, self.config.lock_timeout);
        self.reporter.set_lock(lock_name);
        match lock::acquire(lock_name, &settings).await {
            Ok(guard) => {
                self.lock = Some(guard);
                Ok(self)
            }
            Err(source) => {
                tracing::error!(class = %self.name, error = %source, "lock acquisition failed");
                if let Err(err) = self.write_report(
                    ClassStatus::Aborted,
                    Some(source.to_string()),
                    CleanupReport::default(),
                ) {
                    tracing::warn!(class = %self.name, error = %err, "failed to write report");
                }
                Err(ClassError::Lock {
                    class: self.name,
                    source,
                })
            }
        }
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the suite configuration.
    #[must_use]
    pub const fn config(&self) -> &SystemTestConfig {
        &self.config
    }

    /// Returns the artifact directory.
    #[must_use]
    pub const fn artifacts(&self) -> &ClassArtifacts {
        self.reporter.artifacts()
    }

    /// Returns the class-scoped cleanup registry.
    pub fn resources(&mut self) -> &mut CleanupRegistry {
        &mut self.resources
    }

    /// Persists this transcript with the class report.
    pub fn record_transcript(&mut self, transcript: &Transcript) {
        self.transcript = Some(transcript.clone());
    }

    /// Runs one case with its own cleanup registry and records the outcome.
    ///
    /// A panicking body is recorded as a failed case; its cleanups still run
    /// and later cases and [`TestClass::finish`] proceed normally.
    ///
    /// Returns true when the case passed.
    pub async fn case<F>(&mut self, case: TestCase, body: F) -> bool
    where
        F: AsyncFnOnce(&mut CleanupRegistry) -> Result<(), CaseError>,
    {
        let mut cleanups = CleanupRegistry::new(format!("{}::{}", self.name, case.name));
        let started = Instant::now();
        tracing::info!(class = %self.name, case = case.name, id = %case.id, "case started");
        let outcome = AssertUnwindSafe(body(&mut cleanups)).catch_unwind().await;
        let cleanup = cleanups.run_all().await;
        let (status, failure) = match outcome {
            Ok(Ok(())) => (CaseStatus::Passed, None),
            Ok(Err(err)) => {
                tracing::warn!(class = %self.name, case = case.name, error = %err, "case failed");
                (CaseStatus::Failed, Some(err.to_string()))
            }
            Err(payload) => {
                let message = format!("case panicked: {}", panic_message(payload.as_ref()));
                tracing::error!(
                    class = %self.name,
                    case = case.name,
                    error = %message,
                    "case panicked"
                );
                (CaseStatus::Failed, Some(message))
            }
        };
        tracing::info!(
            class = %self.name,
            case = case.name,
            status = status.as_str(),
            cleanup_failures = cleanup.failures.len(),
            "case finished"
        );
        self.reporter.record_case(CaseRecord {
            id: case.id.to_string(),
            name: case.name.to_string(),
            status,
            duration_ms: started.elapsed().as_millis(),
            failure,
            cleanup,
        });
        status == CaseStatus::Passed
    }

    /// Aborts the class after a setup failure: drains class cleanups, writes
    /// the report, releases the lock, and returns the setup error.
    pub async fn abort(mut self, error: impl fmt::Display) -> ClassError {
        let message = error.to_string();
        tracing::error!(class = %self.name, error = %message, "class setup failed");
        let cleanup = self.resources.run_all().await;
        if let Err(err) = self.write_report(ClassStatus::Aborted, Some(message.clone()), cleanup) {
            tracing::warn!(class = %self.name, error = %err, "failed to write report");
        }
        drop(self.lock.take());
        ClassError::Setup {
            class: self.name,
            message,
        }
    }

    /// Finishes the class: drains class cleanups, writes the report, then
    /// releases the lock.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::CasesFailed`] when any case failed,
    /// [`ClassError::Cleanup`] when every case passed but a cleanup failed,
    /// and [`ClassError::Report`] when the report cannot be written.
    pub async fn finish(mut self) -> Result<ClassSummary, ClassError> {
        let class_cleanup = self.resources.run_all().await;
        let failed: Vec<String> = self
            .reporter
            .cases()
            .iter()
            .filter(|case| case.status == CaseStatus::Failed)
            .map(|case| case.name.clone())
            .collect();
        let cleanup_failures = self
            .reporter
            .cases()
            .iter()
            .map(|case| case.cleanup.failures.len())
            .sum::<usize>()
            + class_cleanup.failures.len();
        let status = if failed.is_empty() && cleanup_failures == 0 {
            ClassStatus::Passed
        } else {
            ClassStatus::Failed
        };
        let summary = match self.write_report(status, None, class_cleanup) {
            Ok(summary) => summary,
            Err(source) => {
                return Err(ClassError::Report {
                    class: self.name,
                    source,
                });
            }
        };
        drop(self.lock.take());
        tracing::info!(class = %self.name, status = status.as_str(), "class finished");
        if !failed.is_empty() {
            return Err(ClassError::CasesFailed {
                class: self.name,
                failed,
            });
        }
        if cleanup_failures > 0 {
            return Err(ClassError::Cleanup {
                class: self.name,
                count: cleanup_failures,
            });
        }
        Ok(summary)
    }

    /// Writes the transcript (when recorded) and the class summary.
    fn write_report(
        &mut self,
        status: ClassStatus,
        setup_error: Option<String>,
        class_cleanup: CleanupReport,
    ) -> io::Result<ClassSummary> {
        let mut artifacts = Vec::new();
        if let Some(transcript) = &self.transcript {
            self.reporter.artifacts().write_json(TRANSCRIPT_ARTIFACT, &transcript.snapshot())?;
            artifacts.push(TRANSCRIPT_ARTIFACT.to_string());
        }
        self.reporter.finish(status, setup_error, class_cleanup, Vec::new(), artifacts)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts the message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
