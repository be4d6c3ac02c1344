pub mod address;
pub mod config;
pub mod server;
pub mod token_file;
pub mod vault_client;

pub use address::AddressError;
pub use config::ConfigError;
pub use server::ServerError;
pub use token_file::TokenFileError;
pub use vault_client::VaultClientError;

use common::ErrorLocation;

use thiserror::Error;

/// Any failure the fixture can report.
///
/// All of these are environment preconditions from the point of view of a
/// test suite: there is no retry, the suite aborts.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    TokenFile(#[from] TokenFileError),

    #[error(transparent)]
    VaultClient(#[from] VaultClientError),

    #[error("Logger Error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },
}
