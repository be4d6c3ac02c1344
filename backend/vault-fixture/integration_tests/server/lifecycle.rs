use crate::helpers::{
    CRASHING_SERVER, FAKE_ROOT_TOKEN, FAKE_UNSEAL_KEY, HEALTHY_SERVER, SILENT_SERVER, fake_vault,
    read_token, write_token,
};

use vault_fixture::error::{FixtureError, ServerError};
use vault_fixture::{DevServer, FreePort, logger};

use std::time::Duration;

use serial_test::serial;

// ============================================================================
// Lifecycle tests against a fake `vault` script.
// Serialized: writing and then exec'ing a script races with concurrent forks
// (ETXTBSY).
// ============================================================================

/// **VALUE**: Verifies the full start → client → shut_down cycle.
///
/// **WHY THIS MATTERS**: This is the whole point of the crate: a running server, its
/// secrets, and a client aimed at it.
///
/// **BUG THIS CATCHES**: Would catch if `running` flips before scanning completes,
/// if credentials survive shutdown, or if the client gets the wrong address/token.
#[tokio::test]
#[serial]
async fn given_healthy_server_when_started_then_credentials_and_client_are_ready() {
    logger::initialize().expect("logger");

    // GIVEN: A fake server and an idle handle
    let fake = fake_vault(HEALTHY_SERVER);
    let mut server = DevServer::with_config("127.0.0.1:18210", fake.config());
    assert!(!server.is_running());
    assert!(server.root_token().is_none());

    // WHEN: Starting
    server.start().await.expect("start should succeed");

    // THEN: Running with both secrets and a matching client
    assert!(server.is_running());
    assert_eq!(server.unseal_key(), Some(FAKE_UNSEAL_KEY));
    assert_eq!(server.root_token(), Some(FAKE_ROOT_TOKEN));
    assert!(server.pid().is_some());
    assert_eq!(server.user_token_file(), Some(fake.token_file().as_path()));

    let client = server.client().expect("client should build");
    assert_eq!(client.address(), "http://127.0.0.1:18210");
    assert_eq!(client.token(), Some(FAKE_ROOT_TOKEN));

    assert_eq!(fake.launches(), vec!["server -dev -address 127.0.0.1:18210"]);

    // AND WHEN: Shutting down
    server.shut_down().await;

    // THEN: Idle again with secrets cleared
    assert!(!server.is_running());
    assert!(server.unseal_key().is_none());
    assert!(server.root_token().is_none());
    assert!(server.pid().is_none());
}

/// **VALUE**: Verifies that a second `start` does not launch a second process.
///
/// **WHY THIS MATTERS**: Two servers on one address means the second dies on bind and
/// the first is orphaned when the handle forgets it.
///
/// **BUG THIS CATCHES**: Would catch a missing `running` guard in `start`.
#[tokio::test]
#[serial]
async fn given_running_server_when_started_again_then_launches_once() {
    // GIVEN: A started server
    let fake = fake_vault(HEALTHY_SERVER);
    let mut server = DevServer::with_config("127.0.0.1:18211", fake.config());
    server.start().await.expect("first start");
    let pid = server.pid();

    // WHEN: Starting again
    server.start().await.expect("second start is a no-op");

    // THEN: Only one launch, same process
    assert_eq!(fake.launches().len(), 1);
    assert_eq!(server.pid(), pid);

    server.shut_down().await;
}

/// **VALUE**: Verifies that the user's token file is restored after a run.
///
/// **WHY THIS MATTERS**: The dev server overwrites `~/.vault-token` on every start.
///
/// **BUG THIS CATCHES**: Would catch a capture that happens after launch, or a shutdown
/// that skips restoration.
#[tokio::test]
#[serial]
async fn given_existing_token_file_when_cycle_completes_then_original_is_restored() {
    // GIVEN: A pre-existing token
    let fake = fake_vault(HEALTHY_SERVER);
    write_token(&fake.token_file(), "ORIGINAL");
    let mut server = DevServer::with_config("127.0.0.1:18212", fake.config());

    // WHEN: Starting (the fake overwrites the file) and shutting down
    server.start().await.expect("start");
    assert_eq!(read_token(&fake.token_file()), FAKE_ROOT_TOKEN);
    server.shut_down().await;

    // THEN: The original is back
    assert_eq!(read_token(&fake.token_file()), "ORIGINAL");
}

#[tokio::test]
#[serial]
async fn given_no_token_file_when_cycle_completes_then_server_file_is_left() {
    let fake = fake_vault(HEALTHY_SERVER);
    let mut server = DevServer::with_config("127.0.0.1:18213", fake.config());

    server.start().await.expect("start");
    server.shut_down().await;

    assert_eq!(read_token(&fake.token_file()), FAKE_ROOT_TOKEN);
}

/// **VALUE**: Verifies that a server exiting before printing credentials fails start
/// cleanly instead of hanging.
///
/// **WHY THIS MATTERS**: A busy port or bad flag makes Vault exit within milliseconds.
/// Setup must report that, not block the suite forever.
///
/// **BUG THIS CATCHES**: Would catch a scan loop that ignores end-of-stream, or a failed
/// start that leaves the user's token overwritten.
#[tokio::test]
#[serial]
async fn given_crashing_server_when_started_then_returns_output_closed_and_restores_token() {
    // GIVEN: A server that overwrites the token and exits
    let fake = fake_vault(CRASHING_SERVER);
    write_token(&fake.token_file(), "ORIGINAL");
    let mut server = DevServer::with_config("127.0.0.1:18214", fake.config());

    // WHEN: Starting
    let result = server.start().await;

    // THEN: OutputClosed, idle, token restored
    assert!(
        matches!(result, Err(FixtureError::Server(ServerError::OutputClosed { .. }))),
        "{result:?}"
    );
    assert!(!server.is_running());
    assert!(server.root_token().is_none());
    assert_eq!(read_token(&fake.token_file()), "ORIGINAL");
}

#[tokio::test]
#[serial]
async fn given_silent_server_when_started_then_times_out() {
    let fake = fake_vault(SILENT_SERVER);
    let config = fake.config().with_startup_timeout(Duration::from_millis(300));
    let mut server = DevServer::with_config("127.0.0.1:18215", config);

    let result = server.start().await;

    assert!(
        matches!(result, Err(FixtureError::Server(ServerError::StartupTimeout { .. }))),
        "{result:?}"
    );
    assert!(!server.is_running());
    assert!(server.pid().is_none());
}

/// **VALUE**: Verifies the free-port variant end to end with the fake server.
///
/// **WHY THIS MATTERS**: The free-port strategy replaces a whole second lifecycle; it must
/// feed its address through to the launched process.
///
/// **BUG THIS CATCHES**: Would catch if the provider's address is resolved but not used.
#[tokio::test]
#[serial]
async fn given_free_port_provider_when_started_then_server_binds_allocated_address() {
    // GIVEN: A handle on a free port
    let fake = fake_vault(HEALTHY_SERVER);
    let mut server =
        DevServer::with_provider(&FreePort::default(), fake.config()).expect("free port");
    let address = server.address().to_string();

    // WHEN: Starting
    server.start().await.expect("start");

    // THEN: The fake was told to bind there and the client targets it
    assert_eq!(fake.launches(), vec![format!("server -dev -address {address}")]);
    assert_eq!(server.client().unwrap().address(), format!("http://{address}"));

    server.shut_down().await;
}

#[tokio::test]
#[serial]
async fn given_stopped_server_when_started_again_then_runs_second_cycle() {
    let fake = fake_vault(HEALTHY_SERVER);
    write_token(&fake.token_file(), "ORIGINAL");
    let mut server = DevServer::with_config("127.0.0.1:18216", fake.config());

    server.start().await.expect("first cycle");
    server.shut_down().await;
    server.start().await.expect("second cycle");
    assert!(server.is_running());
    server.shut_down().await;

    assert_eq!(fake.launches().len(), 2);
    assert_eq!(read_token(&fake.token_file()), "ORIGINAL");
}
