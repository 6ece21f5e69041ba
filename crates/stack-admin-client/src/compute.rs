// crates/stack-admin-client/src/compute.rs
// ============================================================================
// Module: Compute Quota Clients
// Description: Admin clients for quota sets and quota class sets.
// Purpose: Read, override, and reset compute resource limits.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`QuotasClient`] covers `os-quota-sets` (per project, optionally per user)
//! and [`QuotaClassesClient`] covers `os-quota-class-sets`. Updating the
//! `default` quota class changes limits for every project without overrides,
//! so callers must serialize such updates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use reqwest::Method;

use crate::error::ClientError;
use crate::transport::ServiceTransport;
use crate::transport::envelope;
use crate::types::QuotaClassSet;
use crate::types::QuotaSet;
use crate::types::QuotaUpdate;
use crate::types::QuotaUpdateBody;

// ============================================================================
// SECTION: Quota Sets
// ============================================================================

/// Admin client for project and user quota sets.
#[derive(Debug, Clone)]
pub struct QuotasClient {
    /// Compute transport.
    transport: ServiceTransport,
}

impl QuotasClient {
    /// Creates a quota client over a compute transport.
    #[must_use]
    pub const fn new(transport: ServiceTransport) -> Self {
        Self {
            transport,
        }
    }

    /// Shows the service default quota set as it applies to a project.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the response does
    /// not carry a `quota_set` envelope.
    pub async fn show_default_quota_set(&self, tenant_id: &str) -> Result<QuotaSet, ClientError> {
        let url = self.transport.url(&["os-quota-sets", tenant_id, "defaults"], &[]);
        self.transport.call(Method::GET, url, None, "quota_set").await
    }

    /// Shows the effective quota set for a project, or for one user in it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or cannot be decoded.
    pub async fn show_quota_set(
        &self,
        tenant_id: &str,
        user_id: Option<&str>,
    ) -> Result<QuotaSet, ClientError> {
        let url = self.transport.url(&["os-quota-sets", tenant_id], &user_scope(user_id));
        self.transport.call(Method::GET, url, None, "quota_set").await
    }

    /// Overrides limits for a project, or for one user in it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the service rejects the update (for example
    /// a limit below current usage without `force`).
    pub async fn update_quota_set(
        &self,
        tenant_id: &str,
        user_id: Option<&str>,
        update: &QuotaUpdate,
    ) -> Result<QuotaSet, ClientError> {
        let url = self.transport.url(&["os-quota-sets", tenant_id], &user_scope(user_id));
        let body = envelope(
            "quota_set",
            &QuotaUpdateBody {
                limits: &update.limits,
                force: update.force,
            },
        )?;
        self.transport.call(Method::PUT, url, Some(body), "quota_set").await
    }

    /// Drops overrides so the project (or user) falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub async fn delete_quota_set(
        &self,
        tenant_id: &str,
        user_id: Option<&str>,
    ) -> Result<(), ClientError> {
        let url = self.transport.url(&["os-quota-sets", tenant_id], &user_scope(user_id));
        self.transport.call_empty(Method::DELETE, url, None).await
    }
}

// ============================================================================
// SECTION: Quota Classes
// ============================================================================

/// Admin client for quota class sets.
#[derive(Debug, Clone)]
pub struct QuotaClassesClient {
    /// Compute transport.
    transport: ServiceTransport,
}

impl QuotaClassesClient {
    /// Creates a quota class client over a compute transport.
    #[must_use]
    pub const fn new(transport: ServiceTransport) -> Self {
        Self {
            transport,
        }
    }

    /// Shows a quota class set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or cannot be decoded.
    pub async fn show_quota_class_set(&self, class_id: &str) -> Result<QuotaClassSet, ClientError> {
        let url = self.transport.url(&["os-quota-class-sets", class_id], &[]);
        self.transport.call(Method::GET, url, None, "quota_class_set").await
    }

    /// Replaces limits in a quota class set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the service rejects the update.
    pub async fn update_quota_class_set(
        &self,
        class_id: &str,
        limits: &BTreeMap<String, i64>,
    ) -> Result<QuotaClassSet, ClientError> {
        let url = self.transport.url(&["os-quota-class-sets", class_id], &[]);
        let body = envelope(
            "quota_class_set",
            &QuotaUpdateBody {
                limits,
                force: false,
            },
        )?;
        self.transport.call(Method::PUT, url, Some(body), "quota_class_set").await
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the `user_id` query pair when a user scope is requested.
fn user_scope(user_id: Option<&str>) -> Vec<(&'static str, String)> {
    user_id.map(|user_id| vec![("user_id", user_id.to_string())]).unwrap_or_default()
}
