// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for the conformance suites.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std, stack-admin-client
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 fails closed.
//!
//! Suites target a live deployment only when the compute endpoint, identity
//! endpoint, and admin token are all set. When none of them are set the suites
//! target the in-process cloud stub. A partial set is a configuration error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use stack_admin_client::ClientConfig;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default wait for a named lock before the class fails.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(300);

/// Default prefix for generated resource names.
pub const DEFAULT_RESOURCE_PREFIX: &str = "tempest";

/// Directory name used for lock files under the system temp dir.
const DEFAULT_LOCK_DIR_NAME: &str = "stack-admin-locks";

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Optional run root override.
    RunRoot,
    /// Compute endpoint of a live deployment.
    ComputeUrl,
    /// Identity endpoint of a live deployment.
    IdentityUrl,
    /// Pre-issued admin token for a live deployment.
    Token,
    /// Optional compute API microversion.
    ComputeMicroversion,
    /// Optional request timeout override in seconds (positive integer).
    TimeoutSeconds,
    /// Optional directory holding named lock files.
    LockDir,
    /// Optional lock acquisition timeout in seconds (positive integer).
    LockTimeoutSeconds,
    /// Optional prefix for generated resource names.
    ResourcePrefix,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunRoot => "STACK_ADMIN_SYSTEM_TEST_RUN_ROOT",
            Self::ComputeUrl => "STACK_ADMIN_SYSTEM_TEST_COMPUTE_URL",
            Self::IdentityUrl => "STACK_ADMIN_SYSTEM_TEST_IDENTITY_URL",
            Self::Token => "STACK_ADMIN_SYSTEM_TEST_TOKEN",
            Self::ComputeMicroversion => "STACK_ADMIN_SYSTEM_TEST_COMPUTE_MICROVERSION",
            Self::TimeoutSeconds => "STACK_ADMIN_SYSTEM_TEST_TIMEOUT_SEC",
            Self::LockDir => "STACK_ADMIN_SYSTEM_TEST_LOCK_DIR",
            Self::LockTimeoutSeconds => "STACK_ADMIN_SYSTEM_TEST_LOCK_TIMEOUT_SEC",
            Self::ResourcePrefix => "STACK_ADMIN_SYSTEM_TEST_RESOURCE_PREFIX",
        }
    }

    /// Returns every key, in declaration order.
    #[must_use]
    pub const fn all() -> [Self; 9] {
        [
            Self::RunRoot,
            Self::ComputeUrl,
            Self::IdentityUrl,
            Self::Token,
            Self::ComputeMicroversion,
            Self::TimeoutSeconds,
            Self::LockDir,
            Self::LockTimeoutSeconds,
            Self::ResourcePrefix,
        ]
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Endpoints and credentials of a live deployment.
#[derive(Clone, PartialEq, Eq)]
pub struct LiveTarget {
    /// Compute endpoint.
    pub compute_url: String,
    /// Identity endpoint.
    pub identity_url: String,
    /// Pre-issued admin token.
    pub token: String,
}

impl fmt::Debug for LiveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveTarget")
            .field("compute_url", &self.compute_url)
            .field("identity_url", &self.identity_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTestConfig {
    /// Optional run root override.
    pub run_root: Option<PathBuf>,
    /// Live deployment, or `None` to target the cloud stub.
    pub live: Option<LiveTarget>,
    /// Optional compute microversion.
    pub compute_microversion: Option<String>,
    /// Optional request timeout override.
    pub timeout: Option<Duration>,
    /// Directory holding named lock files.
    pub lock_dir: PathBuf,
    /// How long a class waits for its named lock.
    pub lock_timeout: Duration,
    /// Prefix for generated resource names.
    pub resource_prefix: String,
}

impl Default for SystemTestConfig {
    fn default() -> Self {
        Self {
            run_root: None,
            live: None,
            compute_microversion: None,
            timeout: None,
            lock_dir: std::env::temp_dir().join(DEFAULT_LOCK_DIR_NAME),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            resource_prefix: DEFAULT_RESOURCE_PREFIX.to_string(),
        }
    }
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, an invalid timeout or a partial live
    /// target).
    pub fn load() -> Result<Self, String> {
        let defaults = Self::default();
        let run_root = read_env_nonempty(SystemTestEnv::RunRoot.as_str())?.map(PathBuf::from);
        let live = load_live_target()?;
        let compute_microversion =
            read_env_nonempty(SystemTestEnv::ComputeMicroversion.as_str())?;
        let timeout = read_env_nonempty(SystemTestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        let lock_dir = read_env_nonempty(SystemTestEnv::LockDir.as_str())?
            .map_or(defaults.lock_dir, PathBuf::from);
        let lock_timeout = read_env_nonempty(SystemTestEnv::LockTimeoutSeconds.as_str())?
            .map(|value| {
                parse_timeout_seconds(SystemTestEnv::LockTimeoutSeconds.as_str(), &value)
            })
            .transpose()?
            .unwrap_or(defaults.lock_timeout);
        let resource_prefix = read_env_nonempty(SystemTestEnv::ResourcePrefix.as_str())?
            .map(|value| value.trim().to_string())
            .unwrap_or(defaults.resource_prefix);
        Ok(Self {
            run_root,
            live,
            compute_microversion,
            timeout,
            lock_dir,
            lock_timeout,
            resource_prefix,
        })
    }

    /// Returns true when the suites target a live deployment.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Builds a client config for the given endpoints, applying the
    /// configured microversion and timeout.
    #[must_use]
    pub fn client_config(&self, compute_url: &str, identity_url: &str, token: &str) -> ClientConfig {
        let mut config = ClientConfig::new(compute_url, identity_url, token);
        config.compute_microversion.clone_from(&self.compute_microversion);
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        config
    }

    /// Builds the client config for the live target, if one is configured.
    #[must_use]
    pub fn live_client_config(&self) -> Option<ClientConfig> {
        self.live
            .as_ref()
            .map(|live| self.client_config(&live.compute_url, &live.identity_url, &live.token))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the live target variables, requiring all or none of them.
///
/// # Errors
///
/// Returns an error when only some of the live target variables are set.
fn load_live_target() -> Result<Option<LiveTarget>, String> {
    let compute_url = read_env_nonempty(SystemTestEnv::ComputeUrl.as_str())?;
    let identity_url = read_env_nonempty(SystemTestEnv::IdentityUrl.as_str())?;
    let token = read_env_nonempty(SystemTestEnv::Token.as_str())?;
    match (compute_url, identity_url, token) {
        (Some(compute_url), Some(identity_url), Some(token)) => Ok(Some(LiveTarget {
            compute_url,
            identity_url,
            token,
        })),
        (None, None, None) => Ok(None),
        _ => Err(format!(
            "{}, {}, and {} must be set together",
            SystemTestEnv::ComputeUrl.as_str(),
            SystemTestEnv::IdentityUrl.as_str(),
            SystemTestEnv::Token.as_str()
        )),
    }
}

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is missing, non-numeric, or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{name} must be a positive integer number of seconds"));
    }
    let secs: u64 = trimmed
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}
