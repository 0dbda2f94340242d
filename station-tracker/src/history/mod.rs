//! Earlier snapshots from version-control history.
//!
//! Output directories are committed after every run, so the previous
//! snapshot is simply the snapshot file as of an earlier revision.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::domain::Station;
use crate::record::read_snapshot;

/// Errors from reading history.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The history tool could not be run
    #[error("failed to run git: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not exist at that revision
    #[error("{path} not found at {revision}: {message}")]
    NotFound {
        revision: String,
        path: String,
        message: String,
    },

    /// The file exists but is not UTF-8
    #[error("{path} at {revision} is not valid UTF-8")]
    Encoding { revision: String, path: String },
}

/// Source of file contents as of an earlier revision.
pub trait SnapshotHistory {
    /// Return the text of `path` as it was at `revision`.
    fn file_at(&self, revision: &str, path: &Path) -> Result<String, HistoryError>;
}

/// [`SnapshotHistory`] backed by a local git repository.
#[derive(Debug, Clone)]
pub struct GitHistory {
    repo: PathBuf,
}

impl GitHistory {
    /// Read history from the repository at (or containing) `repo`.
    ///
    /// Paths passed to [`SnapshotHistory::file_at`] are relative to `repo`.
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    /// The `<revision>:./<path>` object name passed to `git show`.
    ///
    /// The `./` makes git resolve `path` relative to the `-C` directory
    /// rather than the repository root.
    fn object_name(revision: &str, path: &Path) -> String {
        let path = path.to_string_lossy().replace('\\', "/");
        let path = path.trim_start_matches("./");
        format!("{revision}:./{path}")
    }
}

impl SnapshotHistory for GitHistory {
    fn file_at(&self, revision: &str, path: &Path) -> Result<String, HistoryError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .arg("show")
            .arg(Self::object_name(revision, path))
            .output()?;

        if !output.status.success() {
            return Err(HistoryError::NotFound {
                revision: revision.to_string(),
                path: path.display().to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| HistoryError::Encoding {
            revision: revision.to_string(),
            path: path.display().to_string(),
        })
    }
}

/// Load the reference snapshot for a comparison.
///
/// A file missing from history (a system's first run) or one that fails to
/// decode both mean there is no usable reference, so this returns an empty
/// snapshot and every current station will be reported as added. Any other
/// history failure is returned.
pub fn reference_snapshot(
    history: &impl SnapshotHistory,
    revision: &str,
    path: &Path,
) -> Result<Vec<Station>, HistoryError> {
    let text = match history.file_at(revision, path) {
        Ok(text) => text,
        Err(e @ HistoryError::NotFound { .. }) => {
            info!(error = %e, "no previous snapshot; treating every station as new");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    match read_snapshot(&text) {
        Ok(stations) => Ok(stations),
        Err(e) => {
            warn!(error = %e, path = %path.display(), revision, "previous snapshot is unreadable; ignoring it");
            Ok(Vec::new())
        }
    }
}
