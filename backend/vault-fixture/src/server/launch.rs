use crate::error::ServerError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::{debug, info};
use tokio::process::Child as TokioChild;
use tokio::process::Command as TokioCommand;

const SERVER_COMMAND: &str = "server";
const DEV_FLAG: &str = "-dev";
const ADDRESS_FLAG: &str = "-address";
const HOME_ENV: &str = "HOME";

/// Resolve the server executable against `PATH`.
///
/// Paths containing a separator are checked as-is.
#[track_caller]
pub(crate) fn locate_binary(binary: &str) -> Result<PathBuf, ServerError> {
    which::which(binary).map_err(|e| ServerError::BinaryNotFound {
        message: format!("'{binary}' is not installed and available on the path: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })
}

/// `<binary> server -dev -address <address>` with stdout piped for scanning
/// and stderr passed straight through to ours.
pub(crate) fn build_server_command(
    binary: &Path,
    address: &str,
    home_override: Option<&Path>,
) -> TokioCommand {
    let mut cmd = TokioCommand::new(binary);
    cmd.arg(SERVER_COMMAND)
        .arg(DEV_FLAG)
        .arg(ADDRESS_FLAG)
        .arg(address)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    // The server writes its token file under $HOME; keep it pointed at the
    // same file we saved.
    if let Some(home) = home_override {
        cmd.env(HOME_ENV, home);
    }

    cmd
}

#[track_caller]
pub(crate) fn spawn_server(mut cmd: TokioCommand) -> Result<TokioChild, ServerError> {
    let program = cmd.as_std().get_program().to_string_lossy().to_string();
    debug!("Spawning {program}");

    let child = cmd.spawn().map_err(|e| ServerError::Spawn {
        message: format!("Failed to start {program}: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })?;

    info!("Spawned {program} (PID: {:?})", child.id());
    Ok(child)
}
