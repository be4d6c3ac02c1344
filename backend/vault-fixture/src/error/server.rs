use common::ErrorLocation;

use std::error::Error as StdError;
use std::io::Error as IoError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ServerError {
    #[error("Binary Not Found Error: {message} {location}")]
    BinaryNotFound {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Spawn Error: {message} {location}")]
    Spawn {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Stdout Error: {message} {location}")]
    Stdout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Output Read Error: {message} {location}")]
    OutputRead {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Startup Failed Error: {message} {location}")]
    OutputClosed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Startup Timeout Error: {message} {location}")]
    StartupTimeout {
        message: String,
        location: ErrorLocation,
    },
}
