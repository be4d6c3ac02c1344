use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Raised when a redacted value is handed to a serializer.
#[derive(Debug, ThisError)]
pub enum RedactError {
    #[error("Redaction Error: {type_name} cannot be serialized, call expose() explicitly {location}")]
    SerializationRefused {
        type_name: &'static str,
        location: ErrorLocation,
    },
}
