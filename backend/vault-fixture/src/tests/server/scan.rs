// Unit tests for credential extraction from startup output

use crate::error::ServerError;
use crate::server::scan::{
    CredentialScanner, ScanState, decode_line, extract_value, get_root_token_regex,
    get_unseal_key_regex, scan_startup_output,
};

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};
use tokio::time::Instant;

const DEV_SERVER_BANNER: &str = "\
==> Vault server configuration:

             Api Address: http://127.0.0.1:8200
                     Cgo: disabled
              Listener 1: tcp (addr: \"127.0.0.1:8200\", cluster address: \"127.0.0.1:8201\", tls: \"disabled\")

==> Vault server started! Log data will stream in below:

WARNING! dev mode is enabled! In this mode, Vault runs entirely in-memory
and starts unsealed with a single unseal key. The root token is already
authenticated to the CLI, so you can immediately begin using Vault.

The unseal key and root token are displayed below in case you want to
seal/unseal the Vault or re-authenticate.

Unseal Key: 3ZVq0G2z1eWCz3pEoM0B6kAe0yH6mZz5o3wmXk6lPA0=
Root Token: hvs.6j4cuewowBGit65rheNoceI7

Development mode should NOT be used in production installations!
";

fn far_deadline() -> Instant {
    Instant::now() + Duration::from_secs(5)
}

/// **VALUE**: Verifies extraction in both relative orders with surrounding whitespace removed.
///
/// **WHY THIS MATTERS**: The extracted values are used verbatim as a bearer token. A
/// leading space or trailing newline turns every request into a 403.
///
/// **BUG THIS CATCHES**: Would catch a trim whose result is discarded instead of stored,
/// or an order-dependent scanner.
#[test]
fn given_credential_lines_in_either_order_when_observed_then_extracts_trimmed_values() {
    // GIVEN: Both orders of the two credential lines
    let orders = [
        ["Unseal Key: abc123\n", "Root Token: root-xyz\n"],
        ["Root Token: root-xyz\n", "Unseal Key: abc123\n"],
    ];

    for lines in orders {
        // WHEN: Feeding them to a fresh scanner
        let mut scanner = CredentialScanner::new();
        for line in lines {
            scanner.observe(line);
        }

        // THEN: Both are extracted without whitespace
        let credentials = scanner.into_credentials().expect("both credentials present");
        assert_eq!(credentials.unseal_key.expose(), "abc123");
        assert_eq!(credentials.root_token.expose(), "root-xyz");
    }
}

/// **VALUE**: Verifies that the first matching line wins.
///
/// **WHY THIS MATTERS**: Once a value is known, later output must not replace it; the
/// server's token file and our client must agree on the same root token.
///
/// **BUG THIS CATCHES**: Would catch if patterns keep being checked after resolution.
#[test]
fn given_repeated_root_token_lines_when_observed_then_keeps_first() {
    // GIVEN: Two root token lines
    let mut scanner = CredentialScanner::new();

    // WHEN: Observing both, then the unseal key
    scanner.observe("Root Token: tok1");
    scanner.observe("Root Token: tok2");
    scanner.observe("Unseal Key: key");

    // THEN: The first token is kept
    let credentials = scanner.into_credentials().unwrap();
    assert_eq!(credentials.root_token.expose(), "tok1");
}

#[test]
fn given_lines_when_observed_then_state_only_moves_forward() {
    let mut scanner = CredentialScanner::new();
    assert_eq!(scanner.state(), ScanState::AwaitingBoth);

    assert_eq!(scanner.observe("==> Vault server started!"), ScanState::AwaitingBoth);
    assert_eq!(scanner.observe("Root Token: t"), ScanState::AwaitingUnsealKey);
    assert_eq!(scanner.observe("unrelated"), ScanState::AwaitingUnsealKey);
    assert_eq!(scanner.observe("Unseal Key: k"), ScanState::Complete);
    assert_eq!(scanner.observe("Root Token: other"), ScanState::Complete);
    assert!(scanner.is_complete());
}

/// **VALUE**: Verifies that patterns are anchored at line start.
///
/// **WHY THIS MATTERS**: Vault's log lines can quote "Root Token:" mid-line (e.g. in
/// warnings). Those must not be mistaken for the banner.
///
/// **BUG THIS CATCHES**: Would catch a dropped `^` anchor.
#[test]
fn given_pattern_mid_line_when_observed_then_ignored() {
    let mut scanner = CredentialScanner::new();

    scanner.observe("2024-01-01 [INFO] Root Token: not-this-one");
    scanner.observe("  Unseal Key: indented");

    assert_eq!(scanner.state(), ScanState::AwaitingBoth);
    assert!(!get_root_token_regex().is_match(" Root Token: x"));
    assert!(get_unseal_key_regex().is_match("Unseal Key: x"));
}

#[test]
fn given_blank_value_when_observed_then_pattern_stays_unresolved() {
    let mut scanner = CredentialScanner::new();

    scanner.observe("Unseal Key:   ");
    scanner.observe("Root Token: \r");

    assert_eq!(scanner.state(), ScanState::AwaitingBoth);
    assert!(scanner.into_credentials().is_none());
}

#[test]
fn given_value_containing_separator_when_extracted_then_keeps_remainder() {
    let value = extract_value("Root Token: a: b\r\n").unwrap();

    assert_eq!(value.expose(), "a: b");
    assert!(extract_value("Root Token:no-space").is_none());
}

/// **VALUE**: Verifies the full scan over a realistic dev server banner.
///
/// **WHY THIS MATTERS**: This is the exact shape of output `vault server -dev` prints.
///
/// **BUG THIS CATCHES**: Would catch if the scanner chokes on the surrounding banner,
/// or if it drains output past the credentials.
#[tokio::test]
async fn given_dev_server_banner_when_scanned_then_returns_credentials_and_stops() {
    // GIVEN: The banner as a buffered stream
    let mut output = BufReader::new(DEV_SERVER_BANNER.as_bytes());

    // WHEN: Scanning
    let credentials = scan_startup_output(&mut output, far_deadline()).await.unwrap();
    let mut lines = output.lines();

    // THEN: Credentials are extracted and the rest is still unread
    assert_eq!(credentials.unseal_key.expose(), "3ZVq0G2z1eWCz3pEoM0B6kAe0yH6mZz5o3wmXk6lPA0=");
    assert_eq!(credentials.root_token.expose(), "hvs.6j4cuewowBGit65rheNoceI7");
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some(""));
    assert_eq!(
        lines.next_line().await.unwrap().as_deref(),
        Some("Development mode should NOT be used in production installations!")
    );
}

/// **VALUE**: Verifies that a server exiting before printing credentials is an error.
///
/// **WHY THIS MATTERS**: A port already in use makes Vault exit straight away. Without
/// end-of-stream detection the suite would hang forever in setup.
///
/// **BUG THIS CATCHES**: Would catch a loop that keeps polling a closed stream.
#[tokio::test]
async fn given_output_closed_early_when_scanned_then_returns_output_closed() {
    // GIVEN: Output with only the unseal key
    let output = "Error: listen tcp 127.0.0.1:8200: bind: address already in use\nUnseal Key: abc\n";
    let mut output = BufReader::new(output.as_bytes());

    // WHEN: Scanning
    let result = scan_startup_output(&mut output, far_deadline()).await;

    // THEN: OutputClosed, mentioning the missing state
    match result {
        Err(ServerError::OutputClosed { message, .. }) => {
            assert!(message.contains("AwaitingRootToken"), "{message}")
        }
        other => panic!("Expected OutputClosed, got {other:?}"),
    }
}

/// **VALUE**: Verifies that a silent but still-open stream times out.
///
/// **WHY THIS MATTERS**: A wedged server keeps its stdout open without printing anything.
/// The deadline is the only thing that ends setup in that case.
///
/// **BUG THIS CATCHES**: Would catch if the deadline is not applied to each read.
#[tokio::test]
async fn given_silent_open_stream_when_scanned_then_returns_startup_timeout() {
    // GIVEN: A pipe whose writer stays open after one unrelated line
    let (reader, mut writer) = duplex(1024);
    writer.write_all(b"==> Vault server configuration:\n").await.unwrap();
    let mut output = BufReader::new(reader);

    // WHEN: Scanning with a short deadline
    let deadline = Instant::now() + Duration::from_millis(100);
    let result = scan_startup_output(&mut output, deadline).await;

    // THEN: StartupTimeout
    assert!(matches!(result, Err(ServerError::StartupTimeout { .. })), "{result:?}");
    drop(writer);
}

/// **VALUE**: Verifies that output which is not valid UTF-8 does not abort the scan.
///
/// **WHY THIS MATTERS**: The server's log stream is opaque to the fixture. Plugins and
/// storage backends can print arbitrary bytes before the credential banner.
///
/// **BUG THIS CATCHES**: Would catch a line reader that fails on invalid UTF-8 and turns
/// unrelated noise into an `OutputRead` error.
#[tokio::test]
async fn given_non_utf8_noise_before_banner_when_scanned_then_credentials_are_extracted() {
    // GIVEN: A stream with a garbage line ahead of the credentials
    let (reader, mut writer) = duplex(1024);
    writer
        .write_all(b"log \xff\xfe noise\nUnseal Key: k\nRoot Token: t\n")
        .await
        .unwrap();
    let mut output = BufReader::new(reader);

    // WHEN: Scanning
    let credentials = scan_startup_output(&mut output, far_deadline()).await.unwrap();

    // THEN: Both credentials are found
    assert_eq!(credentials.unseal_key.expose(), "k");
    assert_eq!(credentials.root_token.expose(), "t");
    drop(writer);
}

#[tokio::test]
async fn given_crlf_line_endings_when_scanned_then_values_have_no_carriage_return() {
    let output = "Unseal Key: abc123\r\nRoot Token: root-xyz\r\n";
    let mut output = BufReader::new(output.as_bytes());

    let credentials = scan_startup_output(&mut output, far_deadline()).await.unwrap();

    assert_eq!(credentials.unseal_key.expose(), "abc123");
    assert_eq!(credentials.root_token.expose(), "root-xyz");
}

#[test]
fn given_raw_lines_when_decoded_then_terminator_is_stripped_and_bad_bytes_replaced() {
    assert_eq!(decode_line(b"Root Token: t\n"), "Root Token: t");
    assert_eq!(decode_line(b"Root Token: t\r\n"), "Root Token: t");
    assert_eq!(decode_line(b"no newline"), "no newline");
    assert_eq!(decode_line(b"bad \xff"), "bad \u{FFFD}");
}
