//! Per-invocation FIFO conduit in a private temporary directory.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use tempfile::TempDir;
use tracing::warn;

use crate::error::ActionError;

const CONDUIT_TARGET: &str = "tether_actions::conduit";

/// Uniquely named FIFO, private to one script job.
///
/// The FIFO lives inside a fresh temporary directory so the path is
/// collision-free across concurrent invocations. [`Conduit::cleanup`] is
/// best-effort; the owning directory is removed on drop either way.
pub(crate) struct Conduit {
    dir: TempDir,
    path: Utf8PathBuf,
}

impl Conduit {
    /// Creates the FIFO. Failure aborts the job before anything executes.
    pub(crate) fn create() -> Result<Self, ActionError> {
        let dir = tempfile::Builder::new()
            .prefix("tether-action-")
            .tempdir()
            .map_err(ActionError::Resource)?;
        let path = Utf8PathBuf::from_path_buf(dir.path().join("script.fifo")).map_err(|path| {
            ActionError::Resource(io::Error::other(format!(
                "conduit path is not valid UTF-8: {}",
                path.display()
            )))
        })?;
        mkfifo(path.as_std_path(), Mode::S_IRUSR | Mode::S_IWUSR)
            .map_err(|errno| ActionError::Resource(errno.into()))?;
        Ok(Self { dir, path })
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Removes the FIFO and its directory, logging rather than failing.
    pub(crate) fn cleanup(self) {
        if let Err(source) = fs::remove_file(&self.path) {
            warn!(
                target: CONDUIT_TARGET,
                path = %self.path,
                error = %source,
                "failed to remove script FIFO"
            );
        }
        if let Err(source) = self.dir.close() {
            warn!(
                target: CONDUIT_TARGET,
                error = %source,
                "failed to remove conduit directory"
            );
        }
    }
}
