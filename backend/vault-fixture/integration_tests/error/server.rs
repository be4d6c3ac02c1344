use vault_fixture::error::{FixtureError, ServerError};

use common::ErrorLocation;

use std::error::Error;
use std::io::{Error as IoError, ErrorKind};
use std::panic::Location;

/// **VALUE**: Verifies that `ServerError::BinaryNotFound` carries its location and source.
///
/// **WHY THIS MATTERS**: A missing `vault` is the most common setup failure on a fresh
/// machine. The message must say so plainly and point at where the lookup happened.
///
/// **BUG THIS CATCHES**: Would catch if the location or `#[source]` is dropped from the variant.
#[test]
#[track_caller]
fn given_binary_not_found_error_when_formatted_then_includes_location_and_source() {
    // GIVEN: A BinaryNotFound error
    let location = ErrorLocation::from(Location::caller());
    let err = ServerError::BinaryNotFound {
        message: "'vault' is not installed and available on the path".to_string(),
        location,
        source: Box::new(IoError::new(ErrorKind::NotFound, "not on PATH")),
    };

    // WHEN: Formatting
    let error_string = format!("{err}");

    // THEN: Type, message, location, and chained source
    assert!(error_string.contains("Binary Not Found Error"));
    assert!(error_string.contains("not installed and available on the path"));
    assert!(error_string.contains("server.rs"));
    assert!(err.source().is_some());
}

/// **VALUE**: Verifies the two ways startup scanning can fail are distinguishable.
///
/// **WHY THIS MATTERS**: "Server died" and "server hung" need different fixes (free the port
/// vs raise the timeout). Users only see the Display text.
///
/// **BUG THIS CATCHES**: Would catch if both variants render the same prefix.
#[test]
#[track_caller]
fn given_startup_failures_when_formatted_then_prefixes_differ() {
    // GIVEN: One of each
    let location = ErrorLocation::from(Location::caller());
    let closed = ServerError::OutputClosed {
        message: "output ended in state AwaitingBoth".to_string(),
        location,
    };
    let timeout = ServerError::StartupTimeout {
        message: "no credentials after 30s".to_string(),
        location,
    };

    // WHEN / THEN
    assert!(format!("{closed}").starts_with("Startup Failed Error"));
    assert!(format!("{timeout}").starts_with("Startup Timeout Error"));
    assert!(format!("{timeout}").contains("server.rs"));
}

#[test]
#[track_caller]
fn given_server_error_when_wrapped_in_fixture_error_then_display_is_transparent() {
    let err = ServerError::Stdout {
        message: "Child process has no stdout".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };
    let inner = format!("{err}");

    let wrapped = FixtureError::from(err);

    assert_eq!(format!("{wrapped}"), inner);
}
