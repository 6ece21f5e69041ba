// crates/stack-admin-client/src/clients.rs
// ============================================================================
// Module: Admin Client Bundle
// Description: Configuration and construction of every admin client.
// Purpose: Wire compute and identity clients onto one HTTP client and transcript.
// Dependencies: reqwest
// ============================================================================

//! ## Overview
//! [`AdminClients`] is the single entry point the suites use. All clients
//! share one connection pool, one admin token, and one [`Transcript`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use reqwest::Client;

use crate::compute::QuotaClassesClient;
use crate::compute::QuotasClient;
use crate::error::ClientError;
use crate::identity::DomainsClient;
use crate::identity::ProjectsClient;
use crate::identity::UsersClient;
use crate::transport::COMPUTE_MICROVERSION_HEADER;
use crate::transport::ServiceTransport;
use crate::transport::Transcript;
use crate::transport::TranscriptEntry;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Endpoints and credentials for the admin clients.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Compute endpoint (for example `https://cloud/compute/v2.1`).
    pub compute_url: String,
    /// Identity endpoint (for example `https://cloud/identity/v3`).
    pub identity_url: String,
    /// Pre-issued admin token.
    pub token: String,
    /// Optional compute microversion sent with every compute request.
    pub compute_microversion: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a config with the default timeout and no microversion.
    #[must_use]
    pub fn new(
        compute_url: impl Into<String>,
        identity_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            compute_url: compute_url.into(),
            identity_url: identity_url.into(),
            token: token.into(),
            compute_microversion: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("compute_url", &self.compute_url)
            .field("identity_url", &self.identity_url)
            .field("token", &"<redacted>")
            .field("compute_microversion", &self.compute_microversion)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// SECTION: Client Bundle
// ============================================================================

/// Every admin client, sharing one transport stack.
#[derive(Debug, Clone)]
pub struct AdminClients {
    /// Quota sets.
    pub quotas: QuotasClient,
    /// Quota class sets.
    pub quota_classes: QuotaClassesClient,
    /// Identity projects.
    pub projects: ProjectsClient,
    /// Identity domains.
    pub domains: DomainsClient,
    /// Identity users.
    pub users: UsersClient,
    /// Shared exchange log.
    transcript: Transcript,
}

impl AdminClients {
    /// Builds every client from a config.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when an endpoint or header value is invalid or
    /// the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        if config.timeout.is_zero() {
            return Err(ClientError::Config("request timeout must be non-zero".to_string()));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ClientError::Config(format!("failed to build http client: {err}")))?;
        let transcript = Transcript::new();
        let mut compute = ServiceTransport::new(
            "compute",
            &config.compute_url,
            &config.token,
            http.clone(),
            transcript.clone(),
        )?;
        if let Some(version) = &config.compute_microversion {
            compute = compute.with_header(COMPUTE_MICROVERSION_HEADER, version)?;
        }
        let identity = ServiceTransport::new(
            "identity",
            &config.identity_url,
            &config.token,
            http,
            transcript.clone(),
        )?;
        Ok(Self {
            quotas: QuotasClient::new(compute.clone()),
            quota_classes: QuotaClassesClient::new(compute),
            projects: ProjectsClient::new(identity.clone()),
            domains: DomainsClient::new(identity.clone()),
            users: UsersClient::new(identity),
            transcript,
        })
    }

    /// Returns every exchange recorded so far, in order.
    #[must_use]
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.snapshot()
    }

    /// Returns the shared transcript so exchanges made later can still be
    /// collected.
    #[must_use]
    pub const fn transcript_handle(&self) -> &Transcript {
        &self.transcript
    }
}
