//! Errors raised by the workspace sandbox and checkpoint store.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure of a single sandboxed file operation.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Path is empty")]
    EmptyPath,

    /// Authorization failure: the path resolves outside the workspace root.
    #[error("Path is outside the workspace: {path}")]
    OutsideWorkspace { path: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WorkspaceError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| WorkspaceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for sandbox violations, which are never worth retrying.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, WorkspaceError::OutsideWorkspace { .. })
    }
}

/// Failure while creating or restoring a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write checkpoint archive {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Checkpoint archive {} is unreadable: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Checkpoint entry {entry} is corrupt: {reason}")]
    CorruptEntry { entry: String, reason: String },
}

impl CheckpointError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
