// crates/stack-admin-client/src/lib.rs
// ============================================================================
// Module: Stack Admin Client Library
// Description: Typed async clients for compute quota and identity admin APIs.
// Purpose: Give conformance suites a thin, transcript-capturing API wrapper.
// Dependencies: reqwest, serde, serde_json, thiserror, tracing, url
// ============================================================================

//! ## Overview
//! Stack Admin Client wraps the administrative HTTP APIs exercised by the
//! conformance suites: compute quota sets and quota class sets, and identity
//! projects, domains, and users. [`AdminClients`] builds all of them over one
//! connection pool and records every exchange in a shared [`Transcript`].
//! Invariants:
//! - Every request carries the configured admin token.
//! - Calls are never retried; each failure surfaces as one [`ClientError`].
//! - Response envelopes are decoded strictly; a missing envelope is an error.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod clients;
pub mod compute;
pub mod error;
pub mod identity;
pub mod transport;
pub mod types;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clients::AdminClients;
pub use clients::ClientConfig;
pub use clients::DEFAULT_REQUEST_TIMEOUT;
pub use compute::QuotaClassesClient;
pub use compute::QuotasClient;
pub use error::ClientError;
pub use identity::DomainsClient;
pub use identity::ProjectsClient;
pub use identity::UsersClient;
pub use transport::ServiceTransport;
pub use transport::Transcript;
pub use transport::TranscriptEntry;
pub use types::DEFAULT_QUOTA_RESOURCES;
pub use types::Domain;
pub use types::DomainCreate;
pub use types::DomainUpdate;
pub use types::EXTENDED_QUOTA_RESOURCES;
pub use types::Project;
pub use types::ProjectCreate;
pub use types::ProjectFilter;
pub use types::QuotaClassSet;
pub use types::QuotaSet;
pub use types::QuotaUpdate;
pub use types::UNLIMITED;
pub use types::User;
pub use types::UserCreate;
