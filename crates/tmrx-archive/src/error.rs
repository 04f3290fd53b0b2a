use std::path::PathBuf;

use crate::store::ArtifactKind;

/// Errors that can occur while writing or rotating artifacts.
///
/// Every variant is fatal to the receive loop; nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Failed to create or truncate a live file or directory.
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A write to a live file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The kernel accepted fewer bytes than requested and then stopped.
    #[error("partial write to {path} ({written} of {expected} bytes)")]
    PartialWrite {
        path: PathBuf,
        written: usize,
        expected: usize,
    },

    /// Flushing or syncing a live file failed.
    #[error("failed to flush {path}: {source}")]
    Flush {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Renaming a live file into the archive failed.
    #[error("failed to archive {from} as {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// The live file for this artifact is not open.
    #[error("{0} staging file is not open")]
    NotOpen(ArtifactKind),
}

impl ArchiveError {
    /// The OS error code behind this error, if there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            ArchiveError::Create { source, .. }
            | ArchiveError::Write { source, .. }
            | ArchiveError::Flush { source, .. }
            | ArchiveError::Rename { source, .. } => source.raw_os_error(),
            ArchiveError::PartialWrite { .. } | ArchiveError::NotOpen(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
