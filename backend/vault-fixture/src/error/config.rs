use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config Environment Error: {variable}: {reason} {location}")]
    Environment {
        location: ErrorLocation,
        variable: String,
        reason: String,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn environment(variable: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Environment {
            location: ErrorLocation::from(Location::caller()),
            variable: variable.into(),
            reason: reason.into(),
        }
    }
}
