use vault_fixture::error::TokenFileError;

use common::ErrorLocation;

use std::error::Error;
use std::io::{Error as IoError, ErrorKind};
use std::panic::Location;
use std::path::PathBuf;

/// **VALUE**: Verifies that token file errors name the file involved.
///
/// **WHY THIS MATTERS**: A failed restore means the user's real credentials are gone. The
/// message must say which file needs fixing by hand.
///
/// **BUG THIS CATCHES**: Would catch if `path` is dropped from the Display format.
#[test]
#[track_caller]
fn given_write_error_when_formatted_then_includes_path_and_location() {
    // GIVEN: A Write error
    let err = TokenFileError::Write {
        location: ErrorLocation::from(Location::caller()),
        path: PathBuf::from("/home/alice/.vault-token"),
        source: IoError::new(ErrorKind::PermissionDenied, "permission denied"),
    };

    // WHEN: Formatting
    let error_string = format!("{err}");

    // THEN: Path and location present, source chained
    assert!(error_string.contains("/home/alice/.vault-token"));
    assert!(error_string.contains("token_file.rs"));
    assert!(err.source().is_some());
}

#[test]
#[track_caller]
fn given_home_dir_not_found_when_formatted_then_includes_location() {
    let err = TokenFileError::HomeDirNotFound {
        location: ErrorLocation::from(Location::caller()),
    };

    let error_string = format!("{err}");

    assert!(error_string.contains("token_file.rs"));
}
