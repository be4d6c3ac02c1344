//! Fixture and client configuration.
//!
//! Both structs start from defaults and take overrides from the process
//! environment. The `*_from` variants accept a lookup function so the merge
//! can be exercised without touching the real environment.

use crate::error::ConfigError;
use crate::{VAULT_BINARY, VAULT_DEFAULT_ADDRESS};

use common::RedactedSecret;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info, warn};

const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

pub const ENV_FIXTURE_BINARY: &str = "VAULT_FIXTURE_BINARY";
pub const ENV_FIXTURE_STARTUP_TIMEOUT: &str = "VAULT_FIXTURE_STARTUP_TIMEOUT";
pub const ENV_FIXTURE_HOME: &str = "VAULT_FIXTURE_HOME";

pub const ENV_VAULT_ADDR: &str = "VAULT_ADDR";
pub const ENV_VAULT_TOKEN: &str = "VAULT_TOKEN";
pub const ENV_VAULT_CLIENT_TIMEOUT: &str = "VAULT_CLIENT_TIMEOUT";
pub const ENV_VAULT_NAMESPACE: &str = "VAULT_NAMESPACE";
pub const ENV_VAULT_SKIP_VERIFY: &str = "VAULT_SKIP_VERIFY";

// ============================================
// FIXTURE CONFIG
// ============================================

/// How the fixture launches the dev server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureConfig {
    /// Executable name or path, resolved against `PATH` at start.
    pub binary: String,
    /// Upper bound on waiting for the unseal key and root token.
    pub startup_timeout: Duration,
    /// Home directory holding the credential file. `None` means the
    /// invoking user's home.
    pub home_dir: Option<PathBuf>,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            binary: VAULT_BINARY.to_string(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            home_dir: None,
        }
    }
}

impl FixtureConfig {
    /// Defaults overridden by `.env` (if present) and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Environment`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded .env from: {}", path.display()),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => warn!("Failed to parse .env, ignoring it: {e}"),
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(binary) = non_empty(lookup(ENV_FIXTURE_BINARY)) {
            config.binary = binary;
        }

        if let Some(raw) = non_empty(lookup(ENV_FIXTURE_STARTUP_TIMEOUT)) {
            config.startup_timeout = humantime::parse_duration(&raw).map_err(|e| {
                ConfigError::environment(ENV_FIXTURE_STARTUP_TIMEOUT, format!("'{raw}': {e}"))
            })?;
        }

        if let Some(home) = non_empty(lookup(ENV_FIXTURE_HOME)) {
            config.home_dir = Some(PathBuf::from(home));
        }

        Ok(config)
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn with_home_dir(mut self, home_dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home_dir.into());
        self
    }
}

// ============================================
// CLIENT CONFIG
// ============================================

/// Settings for a [`VaultClient`](crate::VaultClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, e.g. `http://127.0.0.1:8200`.
    pub address: String,
    pub token: Option<RedactedSecret>,
    pub timeout: Duration,
    pub namespace: Option<String>,
    /// Accept any TLS certificate. Only ever meant for local servers.
    pub skip_verify: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: format!("https://{VAULT_DEFAULT_ADDRESS}"),
            token: None,
            timeout: DEFAULT_CLIENT_TIMEOUT,
            namespace: None,
            skip_verify: false,
        }
    }
}

impl ClientConfig {
    /// Apply `VAULT_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Environment`] if a variable is set but malformed.
    pub fn read_environment(self) -> Result<Self, ConfigError> {
        self.read_environment_from(|key| env::var(key).ok())
    }

    pub fn read_environment_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = non_empty(lookup(ENV_VAULT_ADDR)) {
            self.address = address;
        }

        if let Some(token) = non_empty(lookup(ENV_VAULT_TOKEN)) {
            self.token = Some(RedactedSecret::new(token));
        }

        if let Some(raw) = non_empty(lookup(ENV_VAULT_CLIENT_TIMEOUT)) {
            self.timeout = parse_timeout(&raw).ok_or_else(|| {
                ConfigError::environment(ENV_VAULT_CLIENT_TIMEOUT, format!("invalid duration '{raw}'"))
            })?;
        }

        if let Some(namespace) = non_empty(lookup(ENV_VAULT_NAMESPACE)) {
            self.namespace = Some(namespace);
        }

        if let Some(raw) = non_empty(lookup(ENV_VAULT_SKIP_VERIFY)) {
            self.skip_verify = parse_bool(&raw).ok_or_else(|| {
                ConfigError::environment(ENV_VAULT_SKIP_VERIFY, format!("invalid boolean '{raw}'"))
            })?;
        }

        Ok(self)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Bare integers are seconds, anything else goes through humantime.
pub(crate) fn parse_timeout(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw).ok()
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
