//! Dev server lifecycle.
//!
//! [`DevServer`] owns at most one `vault server -dev` child process. The
//! lifecycle is:
//!
//! 1. locate `~/.vault-token` and save its contents
//! 2. find the `vault` executable on `PATH`
//! 3. spawn it with stdout piped
//! 4. scan stdout for the unseal key and root token (bounded by a deadline)
//! 5. on [`DevServer::shut_down`], kill the child and restore the token file
//!
//! Both `start` and `shut_down` are idempotent. Nothing happens on drop: a
//! handle that is dropped while running leaves the server process behind.

pub mod launch;
pub mod scan;
pub mod token_file;

pub use scan::{CredentialScanner, Credentials, ScanState};
pub use token_file::UserTokenFile;

use crate::address::{AddressProvider, FixedAddress, validate_address};
use crate::client::VaultClient;
use crate::config::{ClientConfig, FixtureConfig};
use crate::error::{FixtureError, ServerError};

use launch::{build_server_command, locate_binary, spawn_server};
use scan::scan_startup_output;

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;

use log::{debug, info, warn};
use tokio::io::BufReader;
use tokio::process::{Child as TokioChild, ChildStdout};
use tokio::time::Instant;

/// One ephemeral Vault dev server.
#[derive(Debug)]
pub struct DevServer {
    address: String,
    config: FixtureConfig,
    running: bool,
    child: Option<TokioChild>,
    // Held open (not drained) so the server never writes into a closed pipe.
    output: Option<BufReader<ChildStdout>>,
    credentials: Option<Credentials>,
    token_file: Option<UserTokenFile>,
}

impl DevServer {
    /// Handle for a server on `address` (`host:port`). An empty address means
    /// `127.0.0.1:8200`. Nothing is launched until [`DevServer::start`].
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_config(address, FixtureConfig::default())
    }

    pub fn with_config(address: impl Into<String>, config: FixtureConfig) -> Self {
        let address = FixedAddress::new(address).or_default();

        Self {
            address,
            config,
            running: false,
            child: None,
            output: None,
            credentials: None,
            token_file: None,
        }
    }

    /// Handle whose address comes from `provider`, e.g. [`FreePort`](crate::FreePort).
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Address`] if the provider cannot produce an address.
    pub fn with_provider(
        provider: &impl AddressProvider,
        config: FixtureConfig,
    ) -> Result<Self, FixtureError> {
        let address = provider.resolve()?;
        Ok(Self::with_config(address, config))
    }

    /// Launch the server and wait for its credentials.
    ///
    /// Returns once both the unseal key and root token have been read, or
    /// fails if the output ends first or `startup_timeout` elapses. A handle
    /// that is already running is left alone.
    ///
    /// If startup fails after the process was spawned, the process is killed
    /// and the token file is restored before the error is returned.
    ///
    /// # Errors
    ///
    /// - [`FixtureError::Address`] if the address is not `host:port`
    /// - [`FixtureError::TokenFile`] if the home directory cannot be found
    /// - [`FixtureError::Server`] if the binary is missing, fails to start,
    ///   or never prints its credentials
    pub async fn start(&mut self) -> Result<(), FixtureError> {
        if self.running {
            debug!("Dev server at {} already running, not starting again", self.address);
            return Ok(());
        }

        validate_address(&self.address)?;

        let mut token_file = UserTokenFile::locate(self.config.home_dir.as_deref())?;
        if let Err(e) = token_file.capture() {
            warn!("Could not save user token file, it will not be restored: {e}");
        }

        let binary = locate_binary(&self.config.binary)?;
        let cmd = build_server_command(&binary, &self.address, self.config.home_dir.as_deref());

        info!("Starting Vault dev server at {}", self.address);

        let deadline = Instant::now() + self.config.startup_timeout;
        let mut child = spawn_server(cmd)?;

        let Some(stdout) = child.stdout.take() else {
            abort_start(&mut child, &mut token_file).await;
            return Err(ServerError::Stdout {
                message: String::from("Child process has no stdout"),
                location: ErrorLocation::from(Location::caller()),
            }
            .into());
        };

        let mut output = BufReader::new(stdout);

        let credentials = match scan_startup_output(&mut output, deadline).await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("Dev server at {} failed to start: {e}", self.address);
                abort_start(&mut child, &mut token_file).await;
                return Err(e.into());
            }
        };

        info!(
            "Vault dev server ready at {} (PID: {:?})",
            self.base_url(),
            child.id()
        );

        self.child = Some(child);
        self.output = Some(output);
        self.credentials = Some(credentials);
        self.token_file = Some(token_file);
        self.running = true;

        Ok(())
    }

    /// Kill the server (if running) and restore the user's token file (if one
    /// was saved). Never fails; problems are logged.
    pub async fn shut_down(&mut self) {
        if self.running {
            if let Some(mut child) = self.child.take() {
                kill_child(&mut child).await;
            }
            self.output = None;
            self.credentials = None;
            self.running = false;
            info!("Vault dev server at {} stopped", self.address);
        } else {
            debug!("Dev server at {} not running, nothing to kill", self.address);
        }

        if let Some(token_file) = self.token_file.as_mut()
            && let Err(e) = token_file.restore()
        {
            warn!("Failed to restore user token file: {e}");
        }
    }

    /// Client bound to this server and authenticated with its root token.
    ///
    /// Settings other than the address are read from the `VAULT_*`
    /// environment; the address is always this server's. No network call is made.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Config`] if the environment holds malformed
    /// values, or [`FixtureError::VaultClient`] if the HTTP client cannot be built.
    pub fn client(&self) -> Result<VaultClient, FixtureError> {
        let config = ClientConfig::default().read_environment()?;
        self.client_with(config)
    }

    /// Like [`DevServer::client`], starting from `config` instead of the
    /// environment. The address and token are still overridden.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::VaultClient`] if the HTTP client cannot be built.
    pub fn client_with(&self, mut config: ClientConfig) -> Result<VaultClient, FixtureError> {
        config.address = self.base_url();
        config.token = self.credentials.as_ref().map(|c| c.root_token.clone());

        Ok(VaultClient::new(config)?)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// `http://<address>`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn unseal_key(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.unseal_key.expose())
    }

    pub fn root_token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.root_token.expose())
    }

    /// Credential file location, known once `start` has been called.
    pub fn user_token_file(&self) -> Option<&Path> {
        self.token_file.as_ref().map(UserTokenFile::path)
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(TokioChild::id)
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }
}

impl Drop for DevServer {
    fn drop(&mut self) {
        if self.running {
            warn!(
                "Dev server at {} dropped while running (PID: {:?}); call shut_down() to stop it",
                self.address,
                self.pid()
            );
        }
    }
}

async fn kill_child(child: &mut TokioChild) {
    let pid = child.id();
    match child.kill().await {
        Ok(()) => debug!("Killed dev server process (PID: {pid:?})"),
        Err(e) => warn!("Failed to kill dev server process (PID: {pid:?}): {e}"),
    }
}

async fn abort_start(child: &mut TokioChild, token_file: &mut UserTokenFile) {
    kill_child(child).await;
    if let Err(e) = token_file.restore() {
        warn!("Failed to restore user token file after failed start: {e}");
    }
}
