//! Test helpers for fixture integration tests.
//!
//! Lifecycle tests run against a fake `vault` shell script that prints the
//! same banner as a real dev server. Each fake lives in its own temporary
//! home directory, which the fixture also uses for `.vault-token`.

use vault_fixture::FixtureConfig;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

pub const FAKE_UNSEAL_KEY: &str = "fake-unseal-key==";
pub const FAKE_ROOT_TOKEN: &str = "hvs.fake-root-token";
pub const LAUNCH_LOG: &str = "launches";

/// Records its arguments, overwrites `$HOME/.vault-token` like the real
/// server, prints the dev banner and stays alive until killed.
pub const HEALTHY_SERVER: &str = r#"
echo "$@" >> "$HOME/launches"
printf '%s' 'hvs.fake-root-token' > "$HOME/.vault-token"
echo '==> Vault server configuration:'
echo ''
echo '             Api Address: http://127.0.0.1:8200'
echo '==> Vault server started! Log data will stream in below:'
echo ''
echo 'Unseal Key: fake-unseal-key=='
echo 'Root Token: hvs.fake-root-token'
echo ''
echo 'Development mode should NOT be used in production installations!'
exec sleep 60
"#;

/// Overwrites the token file, then dies before printing credentials.
pub const CRASHING_SERVER: &str = r#"
echo "$@" >> "$HOME/launches"
printf '%s' 'hvs.half-started' > "$HOME/.vault-token"
echo 'Error initializing listener of type tcp: listen tcp 127.0.0.1:8200: bind: address already in use' >&2
exit 1
"#;

/// Keeps stdout open but never prints anything.
pub const SILENT_SERVER: &str = r#"
echo "$@" >> "$HOME/launches"
exec sleep 60
"#;

pub struct FakeVault {
    pub home: TempDir,
    pub binary: PathBuf,
}

impl FakeVault {
    pub fn token_file(&self) -> PathBuf {
        self.home.path().join(".vault-token")
    }

    pub fn config(&self) -> FixtureConfig {
        FixtureConfig::default()
            .with_binary(self.binary.to_string_lossy())
            .with_home_dir(self.home.path())
            .with_startup_timeout(Duration::from_secs(10))
    }

    /// Argument lines the fake was launched with, one per launch.
    pub fn launches(&self) -> Vec<String> {
        fs::read_to_string(self.home.path().join(LAUNCH_LOG))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Write `body` as an executable `vault` script in a fresh home.
#[cfg(unix)]
pub fn fake_vault(body: &str) -> FakeVault {
    use std::os::unix::fs::PermissionsExt;

    let home = TempDir::new().expect("Failed to create temp home");
    let bin_dir = home.path().join("bin");
    fs::create_dir(&bin_dir).expect("Failed to create bin dir");

    let binary = bin_dir.join("vault");
    fs::write(&binary, format!("#!/bin/sh\n{body}")).expect("Failed to write fake vault");
    fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake vault executable");

    FakeVault { home, binary }
}

pub fn write_token(path: &Path, content: &str) {
    fs::write(path, content).expect("Failed to write token file");
}

pub fn read_token(path: &Path) -> String {
    fs::read_to_string(path).expect("Failed to read token file")
}

/// The real `vault` binary, when installed.
pub fn real_vault_available() -> bool {
    which::which("vault").is_ok()
}
