use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum VaultClientError {
    #[error("HTTP Error: {message} {location}")]
    Http {
        message: String,
        is_connection: bool,
        location: ErrorLocation,
    },

    #[error("JSON Error: {message} {location}")]
    Json {
        message: String,
        location: ErrorLocation,
    },

    #[error("URL Parse Error: {message} {location}")]
    UrlParse {
        message: String,
        location: ErrorLocation,
    },

    #[error("Server Error: HTTP {status} - {message} {location}")]
    Server {
        status: HttpStatusCode,
        message: String,
        location: ErrorLocation,
    },
}

impl VaultClientError {
    /// True when the server could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, VaultClientError::Http { is_connection: true, .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            VaultClientError::Server { status, .. } => Some(status.0),
            _ => None,
        }
    }
}

impl From<url::ParseError> for VaultClientError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        VaultClientError::UrlParse {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for VaultClientError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        VaultClientError::Http {
            is_connection: error.is_connect(),
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for VaultClientError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        VaultClientError::Json {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
