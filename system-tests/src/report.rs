// system-tests/src/report.rs
// ============================================================================
// Module: Class Reports
// Description: Artifact directories and deterministic class summaries.
// Purpose: Record per-case outcomes and cleanup results for each class run.
// Dependencies: serde, serde_jcs
// ============================================================================

//! ## Overview
//! Every class run writes `summary.json` (canonical JSON) and `summary.md`
//! under its own artifact root, plus any extra artifacts the runner adds
//! (such as the HTTP transcript). A reporter dropped before it finishes
//! still writes a summary marked `panic` or `unknown`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::config::SystemTestConfig;
use crate::fixtures::CleanupReport;

// ============================================================================
// SECTION: Status Types
// ============================================================================

/// Outcome of one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Every expectation held.
    Passed,
    /// An expectation or API call failed.
    Failed,
}

impl CaseStatus {
    /// Returns the status label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    /// Every case passed and every cleanup succeeded.
    Passed,
    /// A case or cleanup failed.
    Failed,
    /// Lock acquisition or setup failed before cases ran.
    Aborted,
    /// The class panicked before finishing.
    Panic,
    /// The class was dropped without finishing.
    Unknown,
}

impl ClassStatus {
    /// Returns the status label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
            Self::Panic => "panic",
            Self::Unknown => "unknown",
        }
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Result of one case run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseRecord {
    /// Stable case identifier.
    pub id: String,
    /// Case name.
    pub name: String,
    /// Case outcome.
    pub status: CaseStatus,
    /// Wall-clock duration including case cleanups.
    pub duration_ms: u128,
    /// Failure message for failed cases.
    pub failure: Option<String>,
    /// Case-scoped cleanup results.
    pub cleanup: CleanupReport,
}

/// Summary written for every class run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    /// Class name.
    pub class_name: String,
    /// Class outcome.
    pub status: ClassStatus,
    /// Named lock held during the run, if any.
    pub lock: Option<String>,
    /// Start time in milliseconds since the Unix epoch.
    pub started_at_ms: u128,
    /// End time in milliseconds since the Unix epoch.
    pub ended_at_ms: u128,
    /// Wall-clock duration.
    pub duration_ms: u128,
    /// Cases in execution order.
    pub cases: Vec<CaseRecord>,
    /// Lock or setup failure that aborted the class.
    pub setup_error: Option<String>,
    /// Class-scoped cleanup results.
    pub class_cleanup: CleanupReport,
    /// Free-form notes.
    pub notes: Vec<String>,
    /// Extra artifact file names.
    pub artifacts: Vec<String>,
}

impl ClassSummary {
    /// Returns the number of failed cleanups across cases and the class.
    #[must_use]
    pub fn cleanup_failure_count(&self) -> usize {
        self.cases.iter().map(|case| case.cleanup.failures.len()).sum::<usize>()
            + self.class_cleanup.failures.len()
    }
}

// ============================================================================
// SECTION: Artifacts
// ============================================================================

/// Returns the current time in milliseconds since the Unix epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Default artifact root for a class.
fn default_run_root(class_name: &str) -> PathBuf {
    let stamp = now_millis();
    PathBuf::from("target/system-tests").join(format!("run_{stamp}")).join(class_name)
}

/// Artifact directory for one class run.
#[derive(Debug, Clone)]
pub struct ClassArtifacts {
    /// Artifact root.
    root: PathBuf,
}

impl ClassArtifacts {
    /// Creates the artifact root for a class.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn new(class_name: &str, config: &SystemTestConfig) -> io::Result<Self> {
        let root = config
            .run_root
            .as_ref()
            .map_or_else(|| default_run_root(class_name), |root| root.join(class_name));
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
        })
    }

    /// Returns the root directory for the class artifacts.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a JSON artifact using canonical JCS serialization.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        let bytes = serde_jcs::to_vec(value).map_err(|err| io::Error::other(err.to_string()))?;
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Writes a text artifact with UTF-8 encoding.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub fn write_text(&self, name: &str, value: &str) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        fs::write(&path, value.as_bytes())?;
        Ok(path)
    }
}

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// Collects case records and writes the class summary, even on panic.
#[derive(Debug)]
pub struct ClassReporter {
    /// Artifact directory.
    artifacts: ClassArtifacts,
    /// Class name.
    class_name: String,
    /// Start time in milliseconds since the Unix epoch.
    started_at_ms: u128,
    /// Named lock held by the class.
    lock: Option<String>,
    /// Recorded cases.
    cases: Vec<CaseRecord>,
    /// Whether a summary has been written.
    finalized: bool,
}

impl ClassReporter {
    /// Creates a reporter for the named class.
    ///
    /// # Errors
    ///
    /// Returns an error when the artifact root cannot be created.
    pub fn new(class_name: &str, config: &SystemTestConfig) -> io::Result<Self> {
        Ok(Self {
            artifacts: ClassArtifacts::new(class_name, config)?,
            class_name: class_name.to_string(),
            started_at_ms: now_millis(),
            lock: None,
            cases: Vec::new(),
            finalized: false,
        })
    }

    /// Returns the artifact manager.
    #[must_use]
    pub const fn artifacts(&self) -> &ClassArtifacts {
        &self.artifacts
    }

    /// Records the named lock held by the class.
    pub fn set_lock(&mut self, lock: &str) {
        self.lock = Some(lock.to_string());
    }

    /// Appends a case record.
    pub fn record_case(&mut self, record: CaseRecord) {
        self.cases.push(record);
    }

    /// Returns the recorded cases.
    #[must_use]
    pub fn cases(&self) -> &[CaseRecord] {
        &self.cases
    }

    /// Writes the final summary for the class.
    ///
    /// # Errors
    ///
    /// Returns an error when a summary file cannot be written.
    pub fn finish(
        &mut self,
        status: ClassStatus,
        setup_error: Option<String>,
        class_cleanup: CleanupReport,
        notes: Vec<String>,
        artifacts: Vec<String>,
    ) -> io::Result<ClassSummary> {
        let ended_at_ms = now_millis();
        let summary = ClassSummary {
            class_name: self.class_name.clone(),
            status,
            lock: self.lock.clone(),
            started_at_ms: self.started_at_ms,
            ended_at_ms,
            duration_ms: ended_at_ms.saturating_sub(self.started_at_ms),
            cases: self.cases.clone(),
            setup_error,
            class_cleanup,
            notes,
            artifacts,
        };
        self.finalized = true;
        self.artifacts.write_json("summary.json", &summary)?;
        self.artifacts.write_text("summary.md", &summary_markdown(&summary))?;
        Ok(summary)
    }
}

impl Drop for ClassReporter {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        let status =
            if std::thread::panicking() { ClassStatus::Panic } else { ClassStatus::Unknown };
        let _ = self.finish(
            status,
            None,
            CleanupReport::default(),
            vec!["class terminated without explicit summary".to_string()],
            Vec::new(),
        );
    }
}

/// Renders a class summary as Markdown.
fn summary_markdown(summary: &ClassSummary) -> String {
    let mut out = String::new();
    out.push_str("# Conformance Class Summary\n\n");
    out.push_str("## Status\n\n");
    out.push_str(&format!("- Class: {}\n", summary.class_name));
    out.push_str(&format!("- Status: {}\n", summary.status.as_str()));
    out.push_str(&format!("- Lock: {}\n", summary.lock.as_deref().unwrap_or("none")));
    out.push_str(&format!("- Duration (ms): {}\n", summary.duration_ms));
    out.push_str(&format!("- Cleanup failures: {}\n", summary.cleanup_failure_count()));
    if let Some(error) = &summary.setup_error {
        out.push_str(&format!("- Setup error: {error}\n"));
    }
    out.push_str("\n## Cases\n\n");
    if summary.cases.is_empty() {
        out.push_str("- None\n");
    } else {
        out.push_str("| Id | Case | Status | Duration (ms) |\n");
        out.push_str("|---|---|---|---|\n");
        for case in &summary.cases {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                case.id,
                case.name,
                case.status.as_str(),
                case.duration_ms
            ));
        }
        for case in summary.cases.iter().filter(|case| case.failure.is_some()) {
            out.push_str(&format!(
                "\n- {} failed: {}\n",
                case.name,
                case.failure.as_deref().unwrap_or_default()
            ));
        }
    }
    out.push_str("\n## Cleanup Failures\n\n");
    let failures: Vec<_> = summary
        .cases
        .iter()
        .flat_map(|case| case.cleanup.failures.iter())
        .chain(summary.class_cleanup.failures.iter())
        .collect();
    if failures.is_empty() {
        out.push_str("- None\n");
    } else {
        for failure in failures {
            out.push_str(&format!("- {}: {}\n", failure.label, failure.message));
        }
    }
    out.push_str("\n## Notes\n\n");
    if summary.notes.is_empty() {
        out.push_str("- None\n");
    } else {
        for note in &summary.notes {
            out.push_str(&format!("- {note}\n"));
        }
    }
    out.push_str("\n## Artifacts\n\n");
    if summary.artifacts.is_empty() {
        out.push_str("- None\n");
    } else {
        for artifact in &summary.artifacts {
            out.push_str(&format!("- {artifact}\n"));
        }
    }
    out
}
