use common::ErrorLocation;

use std::io::Error as IoError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum AddressError {
    #[error("Invalid Address Error: '{address}': {message} {location}")]
    Invalid {
        address: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Port Allocation Error: {message} {location}")]
    Allocation {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },
}
