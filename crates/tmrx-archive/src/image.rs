use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::write::{create_truncated, flush, write_fully};

/// The in-progress image at the staging path.
pub struct ImageBuffer {
    path: PathBuf,
    file: File,
    bytes_written: u64,
    fragment_count: u64,
    sync: bool,
}

impl ImageBuffer {
    /// Create or truncate the staging file.
    pub fn create(path: impl AsRef<Path>, sync: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = create_truncated(&path)?;
        debug!(?path, "image staging file opened");
        Ok(Self {
            path,
            file,
            bytes_written: 0,
            fragment_count: 0,
            sync,
        })
    }

    /// Append one fragment and flush it before returning.
    pub fn append(&mut self, fragment: &[u8]) -> Result<()> {
        write_fully(&mut self.file, &self.path, fragment)?;
        flush(&mut self.file, &self.path, self.sync)?;
        self.bytes_written += fragment.len() as u64;
        self.fragment_count += 1;
        Ok(())
    }

    /// Flush, sync and close the staging file ahead of a rename.
    pub(crate) fn seal(mut self) -> Result<(PathBuf, u64)> {
        flush(&mut self.file, &self.path, false)?;
        self.file.sync_all().map_err(|source| ArchiveError::Flush {
            path: self.path.clone(),
            source,
        })?;
        Ok((self.path, self.bytes_written))
    }

    /// Staging path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes appended since the file was created.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Fragments appended since the file was created.
    pub fn fragment_count(&self) -> u64 {
        self.fragment_count
    }
}

impl std::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("path", &self.path)
            .field("bytes_written", &self.bytes_written)
            .field("fragment_count", &self.fragment_count)
            .finish()
    }
}
