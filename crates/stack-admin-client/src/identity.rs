// crates/stack-admin-client/src/identity.rs
// ============================================================================
// Module: Identity Admin Clients
// Description: Admin clients for projects, domains, and users.
// Purpose: Create, inspect, filter, and remove identity resources.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! Identity resources form a hierarchy: domains contain projects, projects
//! may nest under parent projects, and users belong to a domain with an
//! optional default project. The service enforces that hierarchy on delete:
//! a domain must be disabled and empty, and a project must be a leaf.

// ============================================================================
// SECTION: Imports
// ============================================================================

use reqwest::Method;

use crate::error::ClientError;
use crate::transport::ServiceTransport;
use crate::transport::envelope;
use crate::types::Domain;
use crate::types::DomainCreate;
use crate::types::DomainUpdate;
use crate::types::Project;
use crate::types::ProjectCreate;
use crate::types::ProjectFilter;
use crate::types::User;
use crate::types::UserCreate;

// ============================================================================
// SECTION: Projects
// ============================================================================

/// Admin client for identity projects.
#[derive(Debug, Clone)]
pub struct ProjectsClient {
    /// Identity transport.
    transport: ServiceTransport,
}

impl ProjectsClient {
    /// Creates a project client over an identity transport.
    #[must_use]
    pub const fn new(transport: ServiceTransport) -> Self {
        Self {
            transport,
        }
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the service rejects the request (for example
    /// a duplicate name in the domain or an unknown parent).
    pub async fn create_project(&self, request: &ProjectCreate) -> Result<Project, ClientError> {
        let url = self.transport.url(&["projects"], &[]);
        let body = envelope("project", request)?;
        self.transport.call(Method::POST, url, Some(body), "project").await
    }

    /// Lists projects matching a server-side filter.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or cannot be decoded.
    pub async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, ClientError> {
        let url = self.transport.url(&["projects"], &filter.query_pairs());
        self.transport.call(Method::GET, url, None, "projects").await
    }

    /// Shows one project.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the project does not exist or the request
    /// fails.
    pub async fn show_project(&self, project_id: &str) -> Result<Project, ClientError> {
        let url = self.transport.url(&["projects", project_id], &[]);
        self.transport.call(Method::GET, url, None, "project").await
    }

    /// Deletes a leaf project.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the project is missing or still has
    /// children.
    pub async fn delete_project(&self, project_id: &str) -> Result<(), ClientError> {
        let url = self.transport.url(&["projects", project_id], &[]);
        self.transport.call_empty(Method::DELETE, url, None).await
    }
}

// ============================================================================
// SECTION: Domains
// ============================================================================

/// Admin client for identity domains.
#[derive(Debug, Clone)]
pub struct DomainsClient {
    /// Identity transport.
    transport: ServiceTransport,
}

impl DomainsClient {
    /// Creates a domain client over an identity transport.
    #[must_use]
    pub const fn new(transport: ServiceTransport) -> Self {
        Self {
            transport,
        }
    }

    /// Creates a domain.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the service rejects the request.
    pub async fn create_domain(&self, request: &DomainCreate) -> Result<Domain, ClientError> {
        let url = self.transport.url(&["domains"], &[]);
        let body = envelope("domain", request)?;
        self.transport.call(Method::POST, url, Some(body), "domain").await
    }

    /// Shows one domain.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the domain does not exist.
    pub async fn show_domain(&self, domain_id: &str) -> Result<Domain, ClientError> {
        let url = self.transport.url(&["domains", domain_id], &[]);
        self.transport.call(Method::GET, url, None, "domain").await
    }

    /// Applies a partial update to a domain.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the domain does not exist.
    pub async fn update_domain(
        &self,
        domain_id: &str,
        update: &DomainUpdate,
    ) -> Result<Domain, ClientError> {
        let url = self.transport.url(&["domains", domain_id], &[]);
        let body = envelope("domain", update)?;
        self.transport.call(Method::PATCH, url, Some(body), "domain").await
    }

    /// Deletes a disabled domain.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the domain is missing, still enabled, or
    /// still owns projects.
    pub async fn delete_domain(&self, domain_id: &str) -> Result<(), ClientError> {
        let url = self.transport.url(&["domains", domain_id], &[]);
        self.transport.call_empty(Method::DELETE, url, None).await
    }
}

// ============================================================================
// SECTION: Users
// ============================================================================

/// Admin client for identity users.
#[derive(Debug, Clone)]
pub struct UsersClient {
    /// Identity transport.
    transport: ServiceTransport,
}

impl UsersClient {
    /// Creates a user client over an identity transport.
    #[must_use]
    pub const fn new(transport: ServiceTransport) -> Self {
        Self {
            transport,
        }
    }

    /// Creates a user.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the service rejects the request.
    pub async fn create_user(&self, request: &UserCreate) -> Result<User, ClientError> {
        let url = self.transport.url(&["users"], &[]);
        let body = envelope("user", request)?;
        self.transport.call(Method::POST, url, Some(body), "user").await
    }

    /// Deletes a user.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the user does not exist.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), ClientError> {
        let url = self.transport.url(&["users", user_id], &[]);
        self.transport.call_empty(Method::DELETE, url, None).await
    }
}
