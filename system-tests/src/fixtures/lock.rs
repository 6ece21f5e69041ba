// system-tests/src/fixtures/lock.rs
// ============================================================================
// Module: Named Lock
// Description: Named mutual exclusion across tasks and processes.
// Purpose: Serialize test classes that mutate shared global service state.
// Dependencies: fs2, tokio, tracing
// ============================================================================

//! ## Overview
//! A named lock is two layers held together: an async mutex shared by every
//! task in this process, and an exclusive advisory lock on
//! `<lock_dir>/<name>.lock` shared with every other process that uses the
//! same directory. Both layers are released when the [`LockGuard`] drops,
//! whatever the outcome of the work it protected.
//! Invariants:
//! - At most one guard per lock path exists at any time.
//! - Acquisition never exceeds the configured timeout; it fails instead.
//! - Lock names are non-empty ASCII alphanumerics, `-`, or `_`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::sync::PoisonError;
use std::time::Duration;

use fs2::FileExt;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Interval between attempts on a contended lock file.
const FILE_LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while acquiring a named lock.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum LockError {
    /// Lock name contains characters that are unsafe in a file name.
    #[error("invalid lock name '{name}': use ASCII letters, digits, '-' or '_'")]
    InvalidName {
        /// Rejected name.
        name: String,
    },
    /// Another holder kept the lock past the timeout.
    #[error("timed out after {waited_ms} ms waiting for lock {name}")]
    Timeout {
        /// Lock name.
        name: String,
        /// Time spent waiting, in milliseconds.
        waited_ms: u128,
    },
    /// Lock directory or file could not be prepared or locked.
    #[error("lock file {path} unavailable: {source}")]
    Io {
        /// Lock file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Where lock files live and how long to wait for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSettings {
    /// Directory shared by every cooperating process.
    pub dir: PathBuf,
    /// Upper bound on acquisition time.
    pub timeout: Duration,
}

impl LockSettings {
    /// Creates lock settings.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            timeout,
        }
    }
}

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Held named lock. Dropping it releases both lock layers.
#[derive(Debug)]
pub struct LockGuard {
    /// Lock name.
    name: String,
    /// Lock file path.
    path: PathBuf,
    /// Open lock file carrying the advisory lock.
    file: File,
    /// When the lock was obtained.
    acquired_at: Instant,
    /// In-process holder slot; released after the file lock.
    _local: OwnedMutexGuard<()>,
}

impl LockGuard {
    /// Returns the lock name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(lock = %self.name, error = %err, "failed to unlock lock file");
        }
        tracing::debug!(
            lock = %self.name,
            held_ms = self.acquired_at.elapsed().as_millis(),
            "released named lock"
        );
    }
}

// ============================================================================
// SECTION: Acquisition
// ============================================================================

/// Acquires the named lock, waiting at most `settings.timeout`.
///
/// # Errors
///
/// Returns [`LockError::InvalidName`] for unsafe names,
/// [`LockError::Timeout`] when the lock stays held past the timeout, and
/// [`LockError::Io`] when the lock file cannot be created or locked.
pub async fn acquire(name: &str, settings: &LockSettings) -> Result<LockGuard, LockError> {
    validate_name(name)?;
    tokio::fs::create_dir_all(&settings.dir).await.map_err(|source| LockError::Io {
        path: settings.dir.clone(),
        source,
    })?;
    let path = settings.dir.join(format!("{name}.lock"));
    let started = Instant::now();
    let deadline = started + settings.timeout;
    tracing::debug!(lock = name, path = %path.display(), "waiting for named lock");

    let local = tokio::time::timeout_at(deadline, local_mutex(&path).lock_owned())
        .await
        .map_err(|_| LockError::Timeout {
            name: name.to_string(),
            waited_ms: started.elapsed().as_millis(),
        })?;

    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .await
        .map_err(|source| LockError::Io {
            path: path.clone(),
            source,
        })?
        .into_std()
        .await;
    loop {
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => break,
            Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                if Instant::now() >= deadline {
                    return Err(LockError::Timeout {
                        name: name.to_string(),
                        waited_ms: started.elapsed().as_millis(),
                    });
                }
                tokio::time::sleep(FILE_LOCK_POLL_INTERVAL).await;
            }
            Err(source) => {
                return Err(LockError::Io {
                    path,
                    source,
                });
            }
        }
    }

    tracing::info!(
        lock = name,
        waited_ms = started.elapsed().as_millis(),
        "acquired named lock"
    );
    Ok(LockGuard {
        name: name.to_string(),
        path,
        file,
        acquired_at: Instant::now(),
        _local: local,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects names that could escape the lock directory or collide oddly.
fn validate_name(name: &str) -> Result<(), LockError> {
    let valid = !name.is_empty()
        && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(LockError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Returns the process-wide async mutex for a lock path.
fn local_mutex(path: &Path) -> Arc<tokio::sync::Mutex<()>> {
    static REGISTRY: OnceLock<Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>> =
        OnceLock::new();
    let mut registry =
        REGISTRY.get_or_init(Mutex::default).lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(registry.entry(path.to_path_buf()).or_default())
}
