use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::write::{create_truncated, flush, write_fully};

/// First line of every catalog.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"ASCII\" standalone=\"yes\"?>\n";

/// Opening root element, followed by a blank line.
pub const CATALOG_OPEN: &str = "<CATALOG>\n\n";

/// Closing root element.
pub const CATALOG_CLOSE: &str = "</CATALOG>\n";

/// Appends catalog entries while keeping the document well-formed at rest.
///
/// The closing root element is always on disk. Between writes the cursor
/// sits immediately before it; each entry is written together with a fresh
/// copy of the closing element and the cursor is moved back, so a reader
/// that opens the file between appends always sees a complete document.
pub struct CatalogWriter {
    path: PathBuf,
    file: File,
    entry_count: u64,
    sync: bool,
}

impl CatalogWriter {
    /// Create (or truncate) the catalog with an empty root element.
    pub fn create(path: impl AsRef<Path>, sync: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = create_truncated(&path)?;

        let mut doc = String::with_capacity(
            XML_DECLARATION.len() + CATALOG_OPEN.len() + CATALOG_CLOSE.len(),
        );
        doc.push_str(XML_DECLARATION);
        doc.push_str(CATALOG_OPEN);
        doc.push_str(CATALOG_CLOSE);
        write_fully(&mut file, &path, doc.as_bytes())?;
        flush(&mut file, &path, sync)?;

        let mut writer = Self {
            path,
            file,
            entry_count: 0,
            sync,
        };
        writer.rewind_before_close()?;
        debug!(path = ?writer.path, "catalog created");
        Ok(writer)
    }

    /// Append one fragment followed by a newline.
    pub fn append_entry(&mut self, fragment: &[u8]) -> Result<()> {
        let mut buf = Vec::with_capacity(fragment.len() + 1 + CATALOG_CLOSE.len());
        buf.extend_from_slice(fragment);
        buf.push(b'\n');
        buf.extend_from_slice(CATALOG_CLOSE.as_bytes());

        write_fully(&mut self.file, &self.path, &buf)?;
        flush(&mut self.file, &self.path, self.sync)?;
        self.rewind_before_close()?;
        self.entry_count += 1;
        Ok(())
    }

    /// Write the closing element as the final bytes and close the file.
    pub fn finalize(mut self) -> Result<PathBuf> {
        write_fully(&mut self.file, &self.path, CATALOG_CLOSE.as_bytes())?;
        let end = self
            .file
            .stream_position()
            .map_err(|source| self.write_err(source))?;
        self.file.set_len(end).map_err(|source| self.write_err(source))?;
        flush(&mut self.file, &self.path, false)?;
        self.file.sync_all().map_err(|source| ArchiveError::Flush {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = ?self.path, entries = self.entry_count, "catalog finalized");
        Ok(self.path)
    }

    /// Catalog path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries appended since creation.
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    fn rewind_before_close(&mut self) -> Result<()> {
        self.file
            .seek(SeekFrom::End(-(CATALOG_CLOSE.len() as i64)))
            .map_err(|source| self.write_err(source))?;
        Ok(())
    }

    fn write_err(&self, source: std::io::Error) -> ArchiveError {
        ArchiveError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for CatalogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogWriter")
            .field("path", &self.path)
            .field("entry_count", &self.entry_count)
            .finish()
    }
}
