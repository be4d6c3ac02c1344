// Unit tests for DevServer state that do not need a server binary

use crate::address::{AddressProvider, FixedAddress};
use crate::config::{ClientConfig, FixtureConfig};
use crate::error::{AddressError, FixtureError, ServerError};
use crate::server::DevServer;

use std::fs;

use tempfile::TempDir;

#[test]
fn given_empty_address_when_constructed_then_uses_default_and_is_idle() {
    let server = DevServer::new("");

    assert_eq!(server.address(), "127.0.0.1:8200");
    assert_eq!(server.base_url(), "http://127.0.0.1:8200");
    assert!(!server.is_running());
    assert!(server.unseal_key().is_none());
    assert!(server.root_token().is_none());
    assert!(server.pid().is_none());
    assert!(server.user_token_file().is_none());
}

/// **VALUE**: Verifies that the handle and the fixed-address provider agree on defaults.
///
/// **WHY THIS MATTERS**: The fixed-address and free-port lifecycles share one code path;
/// the default address must come from the provider, not a second copy in the handle.
///
/// **BUG THIS CATCHES**: Would catch the two defaults drifting apart.
#[test]
fn given_empty_address_when_constructed_then_matches_fixed_address_provider() {
    // GIVEN: The provider's view of an empty address
    let resolved = FixedAddress::new("").resolve().unwrap();

    // WHEN: Constructing handles with an empty address
    let plain = DevServer::new("");
    let configured = DevServer::with_config("", FixtureConfig::default());
    let provided = DevServer::with_provider(&FixedAddress::default(), FixtureConfig::default())
        .unwrap();

    // THEN: All agree
    assert_eq!(plain.address(), resolved);
    assert_eq!(configured.address(), resolved);
    assert_eq!(provided.address(), resolved);
}

/// **VALUE**: Verifies that shutting down a handle that never started is a quiet no-op.
///
/// **WHY THIS MATTERS**: Teardown runs even when setup failed halfway. It must not
/// panic on a missing process or write a token file that was never captured.
///
/// **BUG THIS CATCHES**: Would catch an `unwrap()` on the child or a restore that runs
/// without a prior capture.
#[tokio::test]
async fn given_never_started_when_shut_down_then_no_kill_and_no_write() {
    // GIVEN: A handle with an isolated home
    let home = TempDir::new().unwrap();
    let config = FixtureConfig::default().with_home_dir(home.path());
    let mut server = DevServer::with_config("127.0.0.1:18200", config);

    // WHEN: Shutting down twice
    server.shut_down().await;
    server.shut_down().await;

    // THEN: Still idle, no token file created
    assert!(!server.is_running());
    assert!(!home.path().join(".vault-token").exists());
}

/// **VALUE**: Verifies that the client always targets the fixture's own address.
///
/// **WHY THIS MATTERS**: Developers often have `VAULT_ADDR` exported for their real
/// Vault. Tests must never talk to it.
///
/// **BUG THIS CATCHES**: Would catch if the environment address wins over the fixture's.
#[test]
fn given_foreign_address_in_config_when_client_built_then_fixture_address_wins() {
    // GIVEN: A config pointing elsewhere, as VAULT_ADDR would
    let server = DevServer::new("127.0.0.1:18201");
    let config = ClientConfig {
        address: String::from("https://vault.example.com:8200"),
        ..ClientConfig::default()
    };

    // WHEN: Building the client
    let client = server.client_with(config).unwrap();

    // THEN: Address is the fixture's; no token before start
    assert_eq!(client.address(), server.base_url());
    assert!(client.token().is_none());
}

#[tokio::test]
async fn given_invalid_address_when_started_then_returns_address_error_and_stays_idle() {
    let home = TempDir::new().unwrap();
    let config = FixtureConfig::default().with_home_dir(home.path());
    let mut server = DevServer::with_config("not-an-address", config);

    let result = server.start().await;

    assert!(matches!(
        result,
        Err(FixtureError::Address(AddressError::Invalid { .. }))
    ));
    assert!(!server.is_running());
}

/// **VALUE**: Verifies that a missing server binary fails start without side effects.
///
/// **WHY THIS MATTERS**: The token file is captured before the binary lookup. If lookup
/// fails nothing was overwritten, and the user's file must be untouched.
///
/// **BUG THIS CATCHES**: Would catch a lookup failure that leaves the handle marked
/// running or clobbers the token file.
#[tokio::test]
async fn given_missing_binary_when_started_then_returns_binary_not_found() {
    // GIVEN: An isolated home holding a token, and a binary that does not exist
    let home = TempDir::new().unwrap();
    fs::write(home.path().join(".vault-token"), "ORIGINAL").unwrap();
    let config = FixtureConfig::default()
        .with_home_dir(home.path())
        .with_binary("vault-fixture-definitely-not-installed");
    let mut server = DevServer::with_config("", config);

    // WHEN: Starting
    let result = server.start().await;

    // THEN: BinaryNotFound, idle, token untouched
    assert!(matches!(
        result,
        Err(FixtureError::Server(ServerError::BinaryNotFound { .. }))
    ));
    assert!(!server.is_running());
    assert_eq!(
        fs::read_to_string(home.path().join(".vault-token")).unwrap(),
        "ORIGINAL"
    );
}
