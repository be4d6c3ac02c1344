//! Shared primitives for the Vault test fixture.
//!
//! ## Architecture
//!
//! - **common** (this crate): error location tracking, secret redaction,
//!   HTTP status helpers
//! - **vault-fixture**: dev server lifecycle and the client it hands out
//!
//! Nothing in here knows about processes or Vault itself.

pub mod error;
pub mod http_status;
pub mod redacted_secret;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;
