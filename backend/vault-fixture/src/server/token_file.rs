//! Preservation of the user's `~/.vault-token`.
//!
//! A dev server writes its root token to the credential file unconditionally
//! on startup. The previous contents are captured before launch and written
//! back on shutdown.

use crate::VAULT_TOKEN_FILE_NAME;
use crate::error::TokenFileError;

use common::ErrorLocation;

use std::fmt;
use std::fs;
use std::io::{Error as IoError, ErrorKind, Write};
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{debug, info};
use zeroize::Zeroizing;

/// The credential file and whatever it held before the dev server started.
pub struct UserTokenFile {
    path: PathBuf,
    saved: Option<Zeroizing<Vec<u8>>>,
}

impl fmt::Debug for UserTokenFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserTokenFile")
            .field("path", &self.path)
            .field("saved", &self.saved.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl UserTokenFile {
    /// Locate `<home>/.vault-token`, using `home_override` if given.
    ///
    /// # Errors
    ///
    /// Returns [`TokenFileError::HomeDirNotFound`] if there is no override and
    /// the home directory cannot be determined.
    #[track_caller]
    pub fn locate(home_override: Option<&Path>) -> Result<Self, TokenFileError> {
        let home = match home_override {
            Some(home) => home.to_path_buf(),
            None => dirs::home_dir().ok_or_else(|| TokenFileError::HomeDirNotFound {
                location: ErrorLocation::from(Location::caller()),
            })?,
        };

        Ok(Self::at(home.join(VAULT_TOKEN_FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            saved: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_saved(&self) -> bool {
        self.saved.is_some()
    }

    /// Read the current contents into memory, if the file exists.
    ///
    /// A missing or empty file leaves nothing saved.
    ///
    /// # Errors
    ///
    /// Returns [`TokenFileError::Read`] if the file exists but cannot be read.
    #[track_caller]
    pub fn capture(&mut self) -> Result<(), TokenFileError> {
        self.saved = None;

        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => {
                debug!("Token file {} is empty, nothing to save", self.path.display());
                Ok(())
            }
            Ok(bytes) => {
                debug!(
                    "Saved {} bytes from {} before server start",
                    bytes.len(),
                    self.path.display()
                );
                self.saved = Some(Zeroizing::new(bytes));
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No token file at {}, nothing to save", self.path.display());
                Ok(())
            }
            Err(e) => Err(TokenFileError::Read {
                location: ErrorLocation::from(Location::caller()),
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Write the saved contents back with owner-only permissions.
    ///
    /// Does nothing when nothing was saved. The saved contents are consumed, so
    /// a second call is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TokenFileError::Write`] if the file cannot be written.
    #[track_caller]
    pub fn restore(&mut self) -> Result<(), TokenFileError> {
        let Some(saved) = self.saved.take() else {
            debug!("No saved token for {}, leaving it as is", self.path.display());
            return Ok(());
        };

        let location = ErrorLocation::from(Location::caller());
        let write_error = |source: IoError| TokenFileError::Write {
            location,
            path: self.path.clone(),
            source,
        };

        let mut file = owner_only_options().open(&self.path).map_err(write_error)?;
        file.write_all(&saved).map_err(write_error)?;
        restrict_permissions(&self.path).map_err(write_error)?;

        info!("Restored user token file {}", self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn owner_only_options() -> fs::OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true).mode(0o600);
    options
}

#[cfg(not(unix))]
fn owner_only_options() -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    options
}

// `mode` only applies on creation; an existing file keeps its bits otherwise.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
