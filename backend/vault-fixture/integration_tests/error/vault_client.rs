use vault_fixture::error::VaultClientError;

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

/// **VALUE**: Verifies that a server error reports status, Vault's message, and location.
///
/// **WHY THIS MATTERS**: A 403 from a dev server almost always means the wrong token was
/// used. The status and Vault's own text are what make that obvious.
///
/// **BUG THIS CATCHES**: Would catch if the status is dropped from Display or
/// `status_code()` stops returning it.
#[test]
#[track_caller]
fn given_server_error_when_formatted_then_includes_status_and_message() {
    // GIVEN: A 403 from Vault
    let err = VaultClientError::Server {
        status: HttpStatusCode(403),
        message: "permission denied".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Formatting
    let error_string = format!("{err}");

    // THEN: All three parts present
    assert!(error_string.contains("HTTP 403"));
    assert!(error_string.contains("permission denied"));
    assert!(error_string.contains("vault_client.rs"));
    assert_eq!(err.status_code(), Some(403));
    assert!(!err.is_connection());
}

#[test]
fn given_url_parse_error_when_converted_then_has_no_status() {
    let parse_error = url::Url::parse("not a url").unwrap_err();

    let err = VaultClientError::from(parse_error);

    assert!(matches!(err, VaultClientError::UrlParse { .. }));
    assert_eq!(err.status_code(), None);
    assert!(format!("{err}").starts_with("URL Parse Error"));
}
