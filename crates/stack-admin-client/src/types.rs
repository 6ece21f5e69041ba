// crates/stack-admin-client/src/types.rs
// ============================================================================
// Module: Admin API Types
// Description: Wire types for compute quotas and identity resources.
// Purpose: Map JSON envelopes onto typed snapshots and request bodies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Types here are snapshots of remotely owned resources. They carry only
//! what the conformance suites assert on; unknown response fields are
//! ignored rather than rejected.
//! Invariants:
//! - A quota limit of [`UNLIMITED`] means no enforced limit.
//! - Request builders never serialize unset optional fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Quota Constants
// ============================================================================

/// Sentinel limit value meaning "unlimited".
pub const UNLIMITED: i64 = -1;

/// Resource names every default quota set must expose.
pub const DEFAULT_QUOTA_RESOURCES: [&str; 12] = [
    "injected_file_content_bytes",
    "metadata_items",
    "injected_files",
    "ram",
    "floating_ips",
    "fixed_ips",
    "key_pairs",
    "injected_file_path_bytes",
    "instances",
    "security_group_rules",
    "cores",
    "security_groups",
];

/// Extended resource names accepted by quota updates.
pub const EXTENDED_QUOTA_RESOURCES: [&str; 2] = ["server_groups", "server_group_members"];

// ============================================================================
// SECTION: Quota Types
// ============================================================================

/// Resource limits scoped to a project, optionally narrowed to one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSet {
    /// Project identifier (present on show responses, absent on updates).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Resource name to limit.
    #[serde(flatten)]
    pub limits: BTreeMap<String, i64>,
}

impl QuotaSet {
    /// Returns the limit for a resource.
    #[must_use]
    pub fn limit(&self, resource: &str) -> Option<i64> {
        self.limits.get(resource).copied()
    }

    /// Returns true when the set exposes the resource.
    #[must_use]
    pub fn has(&self, resource: &str) -> bool {
        self.limits.contains_key(resource)
    }
}

/// Named template of default limits (for example the `default` class).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaClassSet {
    /// Class name (present on show responses).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Resource name to limit.
    #[serde(flatten)]
    pub limits: BTreeMap<String, i64>,
}

impl QuotaClassSet {
    /// Returns the limit for a resource.
    #[must_use]
    pub fn limit(&self, resource: &str) -> Option<i64> {
        self.limits.get(resource).copied()
    }

    /// Returns every limit raised by `offset`.
    ///
    /// The offset is applied uniformly, [`UNLIMITED`] included, so callers
    /// should pick an offset large enough that `-1 + offset` is not a
    /// restrictive limit.
    #[must_use]
    pub fn raised_by(&self, offset: i64) -> BTreeMap<String, i64> {
        self.limits
            .iter()
            .map(|(name, value)| (name.clone(), value.saturating_add(offset)))
            .collect()
    }
}

/// Quota update request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotaUpdate {
    /// Limits to set.
    pub limits: BTreeMap<String, i64>,
    /// Bypass the usage check that rejects limits below current usage.
    pub force: bool,
}

impl QuotaUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one resource limit.
    #[must_use]
    pub fn limit(mut self, resource: impl Into<String>, value: i64) -> Self {
        self.limits.insert(resource.into(), value);
        self
    }

    /// Sets the force flag.
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

impl From<BTreeMap<String, i64>> for QuotaUpdate {
    fn from(limits: BTreeMap<String, i64>) -> Self {
        Self {
            limits,
            force: false,
        }
    }
}

impl<const N: usize> From<[(&str, i64); N]> for QuotaUpdate {
    fn from(pairs: [(&str, i64); N]) -> Self {
        pairs.into_iter().fold(Self::new(), |update, (name, value)| update.limit(name, value))
    }
}

/// Serialized body of a quota update.
#[derive(Debug, Serialize)]
pub(crate) struct QuotaUpdateBody<'a> {
    /// Limits to set.
    #[serde(flatten)]
    pub(crate) limits: &'a BTreeMap<String, i64>,
    /// Force flag, omitted when false.
    #[serde(skip_serializing_if = "is_false")]
    pub(crate) force: bool,
}

/// Serde predicate for omitting false flags.
#[allow(clippy::trivially_copy_pass_by_ref, reason = "Serde predicates take references.")]
const fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// SECTION: Identity Types
// ============================================================================

/// Identity project snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub id: String,
    /// Project name (unique within its domain).
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the project is enabled.
    pub enabled: bool,
    /// Owning domain identifier.
    pub domain_id: String,
    /// Parent project (or owning domain for top-level projects).
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Project creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectCreate {
    /// Project name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional enabled flag (service default is enabled).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Optional owning domain (service default is the token's domain).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
    /// Optional parent project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl ProjectCreate {
    /// Creates a request with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Places the project in a domain.
    #[must_use]
    pub fn domain(mut self, domain_id: impl Into<String>) -> Self {
        self.domain_id = Some(domain_id.into());
        self
    }

    /// Nests the project under a parent.
    #[must_use]
    pub fn parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// Server-side filter for project listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Only projects in this domain.
    pub domain_id: Option<String>,
    /// Only projects with this enabled flag.
    pub enabled: Option<bool>,
    /// Only projects with this exact name.
    pub name: Option<String>,
    /// Only projects with this parent.
    pub parent_id: Option<String>,
}

impl ProjectFilter {
    /// Filter by domain.
    #[must_use]
    pub fn domain(domain_id: impl Into<String>) -> Self {
        Self {
            domain_id: Some(domain_id.into()),
            ..Self::default()
        }
    }

    /// Filter by enabled flag.
    #[must_use]
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    /// Filter by exact name.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Filter by parent project.
    #[must_use]
    pub fn parent(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            ..Self::default()
        }
    }

    /// Returns the query pairs for the set filters, in a stable order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(domain_id) = &self.domain_id {
            pairs.push(("domain_id", domain_id.clone()));
        }
        if let Some(enabled) = self.enabled {
            pairs.push(("enabled", enabled.to_string()));
        }
        if let Some(name) = &self.name {
            pairs.push(("name", name.clone()));
        }
        if let Some(parent_id) = &self.parent_id {
            pairs.push(("parent_id", parent_id.clone()));
        }
        pairs
    }
}

/// Identity domain snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Domain identifier.
    pub id: String,
    /// Domain name.
    pub name: String,
    /// Whether the domain is enabled.
    pub enabled: bool,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Domain creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainCreate {
    /// Domain name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional enabled flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl DomainCreate {
    /// Creates a request with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial domain update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainUpdate {
    /// New enabled flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DomainUpdate {
    /// Update that only toggles the enabled flag.
    #[must_use]
    pub const fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            description: None,
        }
    }
}

/// Identity user snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: String,
    /// Login name.
    pub name: String,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the user is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Default project.
    #[serde(default)]
    pub default_project_id: Option<String>,
    /// Owning domain.
    #[serde(default)]
    pub domain_id: Option<String>,
}

/// Serde default for user enablement.
const fn default_enabled() -> bool {
    true
}

/// User creation request.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserCreate {
    /// Login name.
    pub name: String,
    /// Initial password.
    pub password: String,
    /// Optional contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Optional default project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_project_id: Option<String>,
    /// Optional owning domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
}

impl UserCreate {
    /// Creates a request with name and password.
    #[must_use]
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Sets the contact email.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Makes `project` the user's default project and places the user in
    /// the project's domain.
    #[must_use]
    pub fn in_project(mut self, project: &Project) -> Self {
        self.default_project_id = Some(project.id.clone());
        self.domain_id = Some(project.domain_id.clone());
        self
    }
}

impl std::fmt::Debug for UserCreate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCreate")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("email", &self.email)
            .field("default_project_id", &self.default_project_id)
            .field("domain_id", &self.domain_id)
            .finish()
    }
}
