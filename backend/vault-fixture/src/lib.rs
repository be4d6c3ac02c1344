//! Ephemeral Vault dev servers for integration tests.
//!
//! A [`DevServer`] launches `vault server -dev`, scrapes the unseal key and
//! root token from its startup output, and hands back an authenticated
//! [`VaultClient`]. The user's `~/.vault-token`, which the dev server
//! overwrites, is saved before launch and put back on shutdown.
//!
//! ```no_run
//! use vault_fixture::DevServer;
//!
//! # async fn run() -> Result<(), vault_fixture::error::FixtureError> {
//! let mut server = DevServer::new("");
//! server.start().await?;
//!
//! let client = server.client()?;
//! let config = client.read("secret/config").await?;
//! assert!(config.is_some());
//!
//! server.shut_down().await;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod server;

pub use address::{AddressProvider, FixedAddress, FreePort};
pub use client::{Secret, VaultClient};
pub use config::{ClientConfig, FixtureConfig};
pub use server::DevServer;

#[cfg(test)]
mod tests;

pub const VAULT_BINARY: &str = "vault";
pub const VAULT_SERVER_HOSTNAME: &str = "127.0.0.1";
pub const VAULT_DEFAULT_PORT: u16 = 8200;
pub const VAULT_DEFAULT_ADDRESS: &str =
    const_format::concatcp!(VAULT_SERVER_HOSTNAME, ":", VAULT_DEFAULT_PORT);
pub const VAULT_TOKEN_FILE_NAME: &str = ".vault-token";
