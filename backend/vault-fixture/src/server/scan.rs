//! Credential extraction from the dev server's startup banner.
//!
//! `vault server -dev` prints, among other things:
//!
//! ```text
//! Unseal Key: 3ZVq0G2z1eWCz3pEoM0B6kAe0yH6mZz5o3wmXk6lPA0=
//! Root Token: hvs.6j4cuewowBGit65rheNoceI7
//! ```
//!
//! [`CredentialScanner`] is the pure line-by-line state machine;
//! [`scan_startup_output`] drives it from the child's stdout under a deadline.

use crate::error::ServerError;

use common::{ErrorLocation, RedactedSecret};

use std::borrow::Cow;
use std::panic::Location;
use std::sync::OnceLock;

use log::{debug, trace};
use regex::Regex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{Instant, timeout_at};

const UNSEAL_KEY_PATTERN: &str = r"^Unseal Key:.+";
const ROOT_TOKEN_PATTERN: &str = r"^Root Token:.+";
const VALUE_SEPARATOR: &str = ": ";

static UNSEAL_KEY_REGEX: OnceLock<Regex> = OnceLock::new();
static ROOT_TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn get_unseal_key_regex() -> &'static Regex {
    UNSEAL_KEY_REGEX.get_or_init(|| Regex::new(UNSEAL_KEY_PATTERN).expect("valid regex pattern"))
}

pub(crate) fn get_root_token_regex() -> &'static Regex {
    ROOT_TOKEN_REGEX.get_or_init(|| Regex::new(ROOT_TOKEN_PATTERN).expect("valid regex pattern"))
}

/// The two one-time secrets a dev server prints on startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub unseal_key: RedactedSecret,
    pub root_token: RedactedSecret,
}

/// Where the scanner is. There is no way back to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    AwaitingBoth,
    AwaitingUnsealKey,
    AwaitingRootToken,
    Complete,
}

/// Line-by-line matcher for the unseal key and root token.
///
/// Each pattern is only checked while its value is unknown, so the first
/// match wins and later lines are ignored.
#[derive(Debug, Default)]
pub struct CredentialScanner {
    unseal_key: Option<RedactedSecret>,
    root_token: Option<RedactedSecret>,
}

impl CredentialScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line of output.
    pub fn observe(&mut self, line: &str) -> ScanState {
        if self.unseal_key.is_none() && get_unseal_key_regex().is_match(line) {
            self.unseal_key = extract_value(line);
            if self.unseal_key.is_some() {
                debug!("Found unseal key in server output");
            }
            return self.state();
        }

        if self.root_token.is_none() && get_root_token_regex().is_match(line) {
            self.root_token = extract_value(line);
            if self.root_token.is_some() {
                debug!("Found root token in server output");
            }
        }

        self.state()
    }

    pub fn state(&self) -> ScanState {
        match (&self.unseal_key, &self.root_token) {
            (None, None) => ScanState::AwaitingBoth,
            (None, Some(_)) => ScanState::AwaitingUnsealKey,
            (Some(_), None) => ScanState::AwaitingRootToken,
            (Some(_), Some(_)) => ScanState::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state() == ScanState::Complete
    }

    /// Both secrets, or `None` if either is still missing.
    pub fn into_credentials(self) -> Option<Credentials> {
        match (self.unseal_key, self.root_token) {
            (Some(unseal_key), Some(root_token)) => Some(Credentials {
                unseal_key,
                root_token,
            }),
            _ => None,
        }
    }
}

/// Everything after the first `": "`, trimmed. Blank values don't count.
pub(crate) fn extract_value(line: &str) -> Option<RedactedSecret> {
    let (_, raw) = line.split_once(VALUE_SEPARATOR)?;
    let value = raw.trim();

    if value.is_empty() {
        None
    } else {
        Some(RedactedSecret::new(value))
    }
}

/// Read lines from `output` until both secrets are seen, the stream ends, or
/// `deadline` passes. Stops reading as soon as both are known; the rest of the
/// output is left in the pipe.
///
/// Lines are read as bytes and decoded lossily, so output that is not UTF-8
/// is scanned like any other line instead of failing the read.
pub async fn scan_startup_output<R>(
    output: &mut R,
    deadline: Instant,
) -> Result<Credentials, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut scanner = CredentialScanner::new();
    let mut lines_read = 0usize;
    let mut buf = Vec::new();

    while !scanner.is_complete() {
        buf.clear();
        let next = timeout_at(deadline, output.read_until(b'\n', &mut buf))
            .await
            .map_err(|_| ServerError::StartupTimeout {
                message: format!(
                    "Credentials not found before deadline ({lines_read} lines read, state {:?})",
                    scanner.state()
                ),
                location: ErrorLocation::from(Location::caller()),
            })?;

        match next {
            Ok(0) => {
                return Err(ServerError::OutputClosed {
                    message: format!(
                        "Server output closed after {lines_read} lines without printing credentials (state {:?})",
                        scanner.state()
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Ok(_) => {
                lines_read += 1;
                let line = decode_line(&buf);
                // The banner lines carrying secrets are matched, never echoed.
                if get_unseal_key_regex().is_match(&line) || get_root_token_regex().is_match(&line) {
                    trace!("Server output: [credential line]");
                } else {
                    trace!("Server output: {line}");
                }
                scanner.observe(&line);
            }
            Err(e) => {
                return Err(ServerError::OutputRead {
                    message: format!("Failed to read server output: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                    source: e,
                });
            }
        }
    }

    debug!("Credentials extracted after {lines_read} lines");

    scanner
        .into_credentials()
        .ok_or_else(|| ServerError::OutputClosed {
            message: String::from("Scanner reported completion without both credentials"),
            location: ErrorLocation::from(Location::caller()),
        })
}

/// One raw output line as text, without its line terminator.
pub(crate) fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}
