use vault_fixture::{ClientConfig, DevServer, VaultClient};

use common::RedactedSecret;

use std::net::TcpListener;
use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_TOKEN: &str = "hvs.test-token";

fn client_for(server: &MockServer) -> VaultClient {
    VaultClient::new(ClientConfig {
        address: server.uri(),
        token: Some(RedactedSecret::new(TEST_TOKEN)),
        timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    })
    .expect("client should build")
}

fn secret_body(data: Value) -> Value {
    json!({
        "request_id": "c5a3e4b0-0000-0000-0000-000000000000",
        "lease_id": "",
        "lease_duration": 2764800,
        "renewable": false,
        "data": data,
        "warnings": null,
        "auth": null
    })
}

/// **VALUE**: Verifies a read sends Vault's headers and decodes the response envelope.
///
/// **WHY THIS MATTERS**: Every test against the dev server starts with an authenticated read.
///
/// **BUG THIS CATCHES**: Would catch a missing `X-Vault-Token` header, a wrong `/v1/`
/// prefix, or a decode that loses `data`.
#[tokio::test]
async fn given_existing_secret_when_read_then_sends_token_and_returns_data() {
    // GIVEN: A mock Vault holding secret/config
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/config"))
        .and(header("X-Vault-Token", TEST_TOKEN))
        .and(header("X-Vault-Request", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(secret_body(json!({"cas_required": false}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    // WHEN: Reading
    let secret = client_for(&server)
        .read("secret/config")
        .await
        .expect("read should succeed")
        .expect("secret should exist");

    // THEN: The envelope and data are decoded
    assert_eq!(secret.lease_duration, 2764800);
    assert_eq!(secret.get("cas_required"), Some(&json!(false)));
}

#[tokio::test]
async fn given_missing_secret_when_read_then_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
        .mount(&server)
        .await;

    let result = client_for(&server).read("secret/nope").await;

    assert!(result.expect("404 is not an error").is_none());
}

/// **VALUE**: Verifies Vault's error messages are surfaced with the status code.
///
/// **WHY THIS MATTERS**: Vault explains failures in an `errors` array. Dropping it leaves
/// users guessing why a request was refused.
///
/// **BUG THIS CATCHES**: Would catch a client that treats 403 as "not found", or that
/// reports only the status.
#[tokio::test]
async fn given_forbidden_when_read_then_returns_server_error_with_vault_messages() {
    // GIVEN: A 403 with two messages
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/locked"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"errors": ["permission denied", "invalid token"]})),
        )
        .mount(&server)
        .await;

    // WHEN: Reading
    let err = client_for(&server)
        .read("secret/locked")
        .await
        .expect_err("403 should fail");

    // THEN: Status and joined messages
    assert_eq!(err.status_code(), Some(403));
    assert!(format!("{err}").contains("permission denied; invalid token"));
}

#[tokio::test]
async fn given_write_when_vault_returns_no_content_then_sends_body_and_returns_none() {
    let server = MockServer::start().await;
    let payload = json!({"password": "hunter2"});
    Mock::given(method("PUT"))
        .and(path("/v1/secret/app"))
        .and(body_json(payload.clone()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).write("secret/app", &payload).await;

    assert!(result.expect("write should succeed").is_none());
}

#[tokio::test]
async fn given_write_when_vault_returns_body_then_decodes_it() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/secret/data/app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret_body(json!({"version": 1}))))
        .mount(&server)
        .await;

    let secret = client_for(&server)
        .write("secret/data/app", &json!({"data": {"k": "v"}}))
        .await
        .expect("write should succeed")
        .expect("kv v2 returns metadata");

    assert_eq!(secret.get("version"), Some(&json!(1)));
}

#[tokio::test]
async fn given_delete_when_called_then_issues_delete_request() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/secret/app"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete("/secret/app")
        .await
        .expect("delete should succeed");
}

#[tokio::test]
async fn given_list_when_called_then_adds_list_query_and_returns_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/metadata/"))
        .and(query_param("list", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(secret_body(json!({"keys": ["a", "b/"]}))),
        )
        .mount(&server)
        .await;

    let secret = client_for(&server)
        .list("secret/metadata/")
        .await
        .expect("list should succeed")
        .expect("keys should exist");

    assert_eq!(secret.get("keys"), Some(&json!(["a", "b/"])));
}

#[tokio::test]
async fn given_namespace_when_requesting_then_sends_namespace_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts"))
        .and(header("X-Vault-Namespace", "team-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret_body(json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    let client = VaultClient::new(ClientConfig {
        address: server.uri(),
        namespace: Some("team-a".to_string()),
        ..ClientConfig::default()
    })
    .expect("client should build");

    client.read("sys/mounts").await.expect("read should succeed");
}

/// **VALUE**: Verifies that an unreachable server is reported as a connection failure.
///
/// **WHY THIS MATTERS**: "Nothing is listening" and "the server said no" need different
/// fixes; callers tell them apart via `is_connection()`.
///
/// **BUG THIS CATCHES**: Would catch if connection errors are folded into a generic HTTP error.
#[tokio::test]
async fn given_nothing_listening_when_read_then_error_is_connection() {
    // GIVEN: A port that was free a moment ago
    let port = TcpListener::bind(("127.0.0.1", 0))
        .and_then(|l| l.local_addr())
        .expect("probe port")
        .port();
    let client = VaultClient::new(ClientConfig {
        address: format!("http://127.0.0.1:{port}"),
        timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    })
    .expect("client should build");

    // WHEN: Reading
    let err = client.read("secret/config").await.expect_err("should fail");

    // THEN: Flagged as a connection failure
    assert!(err.is_connection(), "{err}");
    assert_eq!(err.status_code(), None);
}

/// **VALUE**: Verifies the fixture's client targets the fixture's address, not 8200.
///
/// **WHY THIS MATTERS**: Free-port fixtures are useless if the client still talks to the
/// default address.
///
/// **BUG THIS CATCHES**: Would catch a client factory that ignores the handle's address.
#[tokio::test]
async fn given_dev_server_handle_when_client_built_then_requests_reach_its_address() {
    // GIVEN: A handle whose address is the mock's
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"initialized": true})))
        .expect(1)
        .mount(&mock)
        .await;
    let handle = DevServer::new(mock.address().to_string());

    // WHEN: Reading through the handle's client
    let client = handle
        .client_with(ClientConfig::default())
        .expect("client should build");
    client.read("sys/health").await.expect("read should succeed");

    // THEN: Never started, so no token was sent
    let requests = mock.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("X-Vault-Token").is_none());
}
