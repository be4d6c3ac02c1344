// Unit tests for credential file preservation

use crate::error::TokenFileError;
use crate::server::token_file::UserTokenFile;

use std::fs;

use tempfile::TempDir;

#[test]
fn given_home_override_when_located_then_points_at_vault_token() {
    let home = TempDir::new().unwrap();

    let token_file = UserTokenFile::locate(Some(home.path())).unwrap();

    assert_eq!(token_file.path(), home.path().join(".vault-token"));
    assert!(!token_file.has_saved());
}

/// **VALUE**: Verifies the core promise: the user's token survives a dev server run.
///
/// **WHY THIS MATTERS**: Developers run suites on the same machine they use Vault from.
/// Losing their `~/.vault-token` logs them out of whatever Vault they were using.
///
/// **BUG THIS CATCHES**: Would catch if capture happens lazily (after overwrite) or if
/// restore writes the wrong bytes.
#[test]
fn given_existing_token_when_overwritten_and_restored_then_original_returns() {
    // GIVEN: A token file with the user's token
    let home = TempDir::new().unwrap();
    let path = home.path().join(".vault-token");
    fs::write(&path, "ORIGINAL").unwrap();
    let mut token_file = UserTokenFile::at(&path);

    // WHEN: Capturing, letting the "server" overwrite, then restoring
    token_file.capture().unwrap();
    fs::write(&path, "hvs.dev-root-token").unwrap();
    token_file.restore().unwrap();

    // THEN: The original content is back and nothing remains saved
    assert_eq!(fs::read_to_string(&path).unwrap(), "ORIGINAL");
    assert!(!token_file.has_saved());
}

/// **VALUE**: Verifies that nothing is written back when there was nothing to save.
///
/// **WHY THIS MATTERS**: Restoration only undoes our own side effect; creating a token
/// file the user never had would be a new one.
#[test]
fn given_no_token_file_when_captured_and_restored_then_no_write_occurs() {
    // GIVEN: No token file
    let home = TempDir::new().unwrap();
    let path = home.path().join(".vault-token");
    let mut token_file = UserTokenFile::at(&path);

    // WHEN: Capturing, the server writing one, then restoring
    token_file.capture().unwrap();
    assert!(!token_file.has_saved());
    fs::write(&path, "hvs.dev-root-token").unwrap();
    token_file.restore().unwrap();

    // THEN: The server's file is left alone
    assert_eq!(fs::read_to_string(&path).unwrap(), "hvs.dev-root-token");
}

#[test]
fn given_empty_token_file_when_captured_then_nothing_saved() {
    let home = TempDir::new().unwrap();
    let path = home.path().join(".vault-token");
    fs::write(&path, "").unwrap();
    let mut token_file = UserTokenFile::at(&path);

    token_file.capture().unwrap();

    assert!(!token_file.has_saved());
}

#[test]
fn given_restored_once_when_restored_again_then_second_is_noop() {
    let home = TempDir::new().unwrap();
    let path = home.path().join(".vault-token");
    fs::write(&path, "ORIGINAL").unwrap();
    let mut token_file = UserTokenFile::at(&path);
    token_file.capture().unwrap();

    token_file.restore().unwrap();
    fs::write(&path, "changed later").unwrap();
    token_file.restore().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "changed later");
}

#[cfg(unix)]
#[test]
fn given_saved_token_when_restored_then_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    // GIVEN: A world-readable token file
    let home = TempDir::new().unwrap();
    let path = home.path().join(".vault-token");
    fs::write(&path, "ORIGINAL").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    let mut token_file = UserTokenFile::at(&path);
    token_file.capture().unwrap();

    // WHEN: Restoring
    token_file.restore().unwrap();

    // THEN: Mode is 0600
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[test]
fn given_unreadable_token_path_when_captured_then_returns_read_error() {
    // A directory where the file should be cannot be read as a file.
    let home = TempDir::new().unwrap();
    let path = home.path().join(".vault-token");
    fs::create_dir(&path).unwrap();
    let mut token_file = UserTokenFile::at(&path);

    let result = token_file.capture();

    assert!(matches!(result, Err(TokenFileError::Read { .. })), "{result:?}");
    assert!(!token_file.has_saved());
}

#[test]
fn given_saved_token_when_debug_formatted_then_content_is_hidden() {
    let home = TempDir::new().unwrap();
    let path = home.path().join(".vault-token");
    fs::write(&path, "hvs.super-secret").unwrap();
    let mut token_file = UserTokenFile::at(&path);
    token_file.capture().unwrap();

    let debug = format!("{token_file:?}");

    assert!(!debug.contains("super-secret"));
    assert!(debug.contains("REDACTED"));
}
