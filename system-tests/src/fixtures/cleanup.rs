// system-tests/src/fixtures/cleanup.rs
// ============================================================================
// Module: Cleanup Registry
// Description: Deferred, dependency-ordered teardown of remote resources.
// Purpose: Guarantee every registered cleanup runs once, in a safe order.
// Dependencies: tracing, thiserror, serde
// ============================================================================

//! ## Overview
//! Each created resource registers an async cleanup the moment it exists.
//! Resources that reference each other declare ordering edges with
//! [`CleanupRegistry::order_before`] (delete a project before its domain).
//! Teardown runs a topological order of those edges; among actions whose
//! predecessors are done, the most recently registered runs first. With no
//! edges this is plain LIFO.
//! Invariants:
//! - Every registered action runs at most once; `run_all` runs all of them.
//! - A failing action never prevents the remaining actions from running.
//! - Edges that would form a cycle are rejected when declared.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BinaryHeap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Boxed cleanup future.
type CleanupFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

/// Deferred cleanup action.
type CleanupAction = Box<dyn FnOnce() -> CleanupFuture + Send>;

/// Handle to a registered cleanup, used to declare ordering edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CleanupHandle(u64);

/// Errors raised while declaring cleanup order.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CleanupError {
    /// The edge would make teardown order impossible.
    #[error("ordering '{first}' before '{then}' would create a cycle")]
    Cycle {
        /// Label of the action that was to run first.
        first: String,
        /// Label of the action that was to run after it.
        then: String,
    },
    /// The handle does not name a pending action in this registry.
    #[error("cleanup handle {0} is not pending in this registry")]
    UnknownHandle(u64),
}

/// One cleanup action that failed during teardown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    /// Action label.
    pub label: String,
    /// Failure message.
    pub message: String,
}

/// Outcome of one teardown pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Labels of every action that ran, in execution order.
    pub executed: Vec<String>,
    /// Actions that returned an error.
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Returns true when every action succeeded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Pending registry entry.
struct CleanupEntry {
    /// Action label for logs and reports.
    label: String,
    /// Deferred action.
    action: CleanupAction,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registry of deferred cleanups for one scope (a class or a case).
pub struct CleanupRegistry {
    /// Scope label used in logs.
    scope: String,
    /// Next handle value.
    next_id: u64,
    /// Pending actions keyed by handle value (registration order).
    entries: BTreeMap<u64, CleanupEntry>,
    /// Ordering edges `(first, then)` between pending actions.
    edges: Vec<(u64, u64)>,
}

impl CleanupRegistry {
    /// Creates an empty registry for a scope.
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            next_id: 0,
            entries: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    /// Returns the scope label.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no actions are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a cleanup action and returns its handle.
    pub fn register<F, Fut, E>(&mut self, label: impl Into<String>, action: F) -> CleanupHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        let label = label.into();
        tracing::debug!(scope = %self.scope, cleanup = %label, "registered cleanup");
        let action: CleanupAction = Box::new(move || {
            Box::pin(async move { action().await.map_err(|err| err.to_string()) })
        });
        self.entries.insert(
            id,
            CleanupEntry {
                label,
                action,
            },
        );
        CleanupHandle(id)
    }

    /// Declares that `first` must run before `then` during teardown.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::UnknownHandle`] when either handle is not
    /// pending here, and [`CleanupError::Cycle`] when `then` already runs
    /// before `first` (directly or transitively) or both are the same action.
    pub fn order_before(
        &mut self,
        first: CleanupHandle,
        then: CleanupHandle,
    ) -> Result<(), CleanupError> {
        let first_label = self.label_of(first)?;
        let then_label = self.label_of(then)?;
        if first == then || self.reaches(then.0, first.0) {
            return Err(CleanupError::Cycle {
                first: first_label,
                then: then_label,
            });
        }
        if !self.edges.contains(&(first.0, then.0)) {
            self.edges.push((first.0, then.0));
        }
        Ok(())
    }

    /// Returns the labels of pending actions in the order `run_all` would
    /// execute them.
    #[must_use]
    pub fn teardown_order(&self) -> Vec<String> {
        self.schedule()
            .into_iter()
            .filter_map(|id| self.entries.get(&id).map(|entry| entry.label.clone()))
            .collect()
    }

    /// Runs every pending action once, isolating failures.
    pub async fn run_all(&mut self) -> CleanupReport {
        let order = self.schedule();
        let mut entries = std::mem::take(&mut self.entries);
        self.edges.clear();
        let mut report = CleanupReport::default();
        for id in order {
            let Some(entry) = entries.remove(&id) else {
                continue;
            };
            tracing::debug!(scope = %self.scope, cleanup = %entry.label, "running cleanup");
            if let Err(message) = (entry.action)().await {
                tracing::warn!(
                    scope = %self.scope,
                    cleanup = %entry.label,
                    error = %message,
                    "cleanup failed"
                );
                report.failures.push(CleanupFailure {
                    label: entry.label.clone(),
                    message,
                });
            }
            report.executed.push(entry.label);
        }
        if !report.executed.is_empty() {
            tracing::info!(
                scope = %self.scope,
                executed = report.executed.len(),
                failed = report.failures.len(),
                "cleanup pass complete"
            );
        }
        report
    }

    /// Returns the label for a pending handle.
    fn label_of(&self, handle: CleanupHandle) -> Result<String, CleanupError> {
        self.entries
            .get(&handle.0)
            .map(|entry| entry.label.clone())
            .ok_or(CleanupError::UnknownHandle(handle.0))
    }

    /// Returns true when `from` must already run before `to` through edges.
    fn reaches(&self, from: u64, to: u64) -> bool {
        let mut stack = vec![from];
        let mut seen = Vec::new();
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if seen.contains(&node) {
                continue;
            }
            seen.push(node);
            stack.extend(
                self.edges.iter().filter(|(first, _)| *first == node).map(|(_, then)| *then),
            );
        }
        false
    }

    /// Topological order of pending actions, newest ready action first.
    fn schedule(&self) -> Vec<u64> {
        let mut pending: BTreeMap<u64, usize> = self.entries.keys().map(|id| (*id, 0)).collect();
        for (_, then) in &self.edges {
            if let Some(count) = pending.get_mut(then) {
                *count += 1;
            }
        }
        let mut ready: BinaryHeap<u64> =
            pending.iter().filter(|(_, count)| **count == 0).map(|(id, _)| *id).collect();
        let mut order = Vec::with_capacity(pending.len());
        while let Some(id) = ready.pop() {
            order.push(id);
            for (_, then) in self.edges.iter().filter(|(first, _)| *first == id) {
                if let Some(count) = pending.get_mut(then) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.push(*then);
                    }
                }
            }
        }
        order
    }
}

impl fmt::Debug for CleanupRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupRegistry")
            .field("scope", &self.scope)
            .field("pending", &self.entries.values().map(|entry| &entry.label).collect::<Vec<_>>())
            .field("edges", &self.edges)
            .finish()
    }
}

impl Drop for CleanupRegistry {
    fn drop(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let leaked: Vec<&str> = self.entries.values().map(|entry| entry.label.as_str()).collect();
        tracing::error!(
            scope = %self.scope,
            leaked = ?leaked,
            "cleanup registry dropped with pending actions"
        );
    }
}
