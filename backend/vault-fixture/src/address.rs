//! Where the dev server binds.
//!
//! A [`DevServer`](crate::DevServer) takes its bind address from an
//! [`AddressProvider`]. Two strategies ship with the crate:
//!
//! - [`FixedAddress`]: a caller-supplied `host:port`, or `127.0.0.1:8200`
//!   when none is given
//! - [`FreePort`]: an unused port picked by the OS, for suites that must not
//!   collide with a developer's own Vault on 8200

use crate::error::AddressError;
use crate::{VAULT_DEFAULT_ADDRESS, VAULT_SERVER_HOSTNAME};

use common::ErrorLocation;

use std::net::TcpListener;
use std::panic::Location;

use log::debug;

/// Strategy for choosing the dev server's `host:port`.
pub trait AddressProvider {
    fn resolve(&self) -> Result<String, AddressError>;
}

/// A fixed bind address. Empty means the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedAddress(pub Option<String>);

impl FixedAddress {
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        if address.is_empty() {
            Self(None)
        } else {
            Self(Some(address))
        }
    }

    /// The configured address, or the default when none was given. Not
    /// validated; [`AddressProvider::resolve`] is the checked path.
    pub fn or_default(self) -> String {
        match self.0 {
            Some(address) if !address.is_empty() => address,
            _ => VAULT_DEFAULT_ADDRESS.to_string(),
        }
    }
}

impl AddressProvider for FixedAddress {
    #[track_caller]
    fn resolve(&self) -> Result<String, AddressError> {
        let address = self.clone().or_default();
        validate_address(&address)?;
        Ok(address)
    }
}

/// Bind to whatever port the OS hands out on `host`.
///
/// The probe socket is closed before the server starts, so another process
/// can in principle grab the port in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreePort {
    pub host: String,
}

impl Default for FreePort {
    fn default() -> Self {
        Self {
            host: VAULT_SERVER_HOSTNAME.to_string(),
        }
    }
}

impl AddressProvider for FreePort {
    #[track_caller]
    fn resolve(&self) -> Result<String, AddressError> {
        let port = free_port(&self.host)?;
        let address = format!("{}:{port}", self.host);
        debug!("Allocated free port {port} on {}", self.host);
        Ok(address)
    }
}

#[track_caller]
fn free_port(host: &str) -> Result<u16, AddressError> {
    let listener = TcpListener::bind((host, 0)).map_err(|e| AddressError::Allocation {
        message: format!("Failed to bind {host}:0: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: e,
    })?;

    let port = listener
        .local_addr()
        .map_err(|e| AddressError::Allocation {
            message: format!("Failed to read local address of probe socket: {e}"),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })?
        .port();

    Ok(port)
}

/// Check that `address` is `host:port` with a non-zero numeric port.
#[track_caller]
pub(crate) fn validate_address(address: &str) -> Result<(), AddressError> {
    let location = ErrorLocation::from(Location::caller());
    let invalid = |message: &str| AddressError::Invalid {
        address: address.to_string(),
        message: message.to_string(),
        location,
    };

    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port"))?;

    if host.is_empty() {
        return Err(invalid("host is empty"));
    }

    match port.parse::<u16>() {
        Ok(0) => Err(invalid("port must be non-zero")),
        Ok(_) => Ok(()),
        Err(_) => Err(invalid("port is not a number between 1 and 65535")),
    }
}
