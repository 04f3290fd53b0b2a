use std::ffi::OsStr;
use std::fmt;
use std::path::PathBuf;

use chrono::Local;
use tracing::{debug, info};

use crate::catalog::CatalogWriter;
use crate::error::{ArchiveError, Result};
use crate::image::ImageBuffer;
use crate::layout::StoreLayout;
use crate::write::rename_into;

/// The two kinds of artifact the store manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Catalog,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Image => f.write_str("image"),
            ArtifactKind::Catalog => f.write_str("catalog"),
        }
    }
}

/// Owns the live image and catalog files and rotates them into the archive.
#[derive(Debug)]
pub struct ArchiveStore {
    layout: StoreLayout,
    image: Option<ImageBuffer>,
    catalog: Option<CatalogWriter>,
    catalog_sequence: u64,
}

impl ArchiveStore {
    /// A store over `layout` with nothing opened yet.
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            layout,
            image: None,
            catalog: None,
            catalog_sequence: 0,
        }
    }

    /// Startup: archive whatever a previous run left at the live paths, then
    /// open a fresh staging image. The catalog is created on first use.
    pub fn open(layout: StoreLayout) -> Result<Self> {
        let mut store = Self::new(layout);
        for dir in [
            store.layout.archive_dir.clone(),
            store.layout.catalog_archive_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .map_err(|source| ArchiveError::Create { path: dir, source })?;
        }
        store.recover_existing(ArtifactKind::Catalog)?;
        store.recover_existing(ArtifactKind::Image)?;
        store.open_staging(ArtifactKind::Image)?;
        Ok(store)
    }

    /// Create (or truncate) the live file for `kind`.
    pub fn open_staging(&mut self, kind: ArtifactKind) -> Result<()> {
        let sync = self.layout.sync_each_fragment;
        match kind {
            ArtifactKind::Image => {
                self.image = Some(ImageBuffer::create(&self.layout.staging_image, sync)?);
            }
            ArtifactKind::Catalog => {
                self.catalog = Some(CatalogWriter::create(&self.layout.catalog, sync)?);
            }
        }
        Ok(())
    }

    /// Archive an artifact left at a live path by a previous run.
    ///
    /// A leftover catalog is archived under a timestamped name; a non-empty
    /// leftover staging image becomes `recovered_<stamp>.img`. Returns the
    /// archive path when something was recovered.
    pub fn recover_existing(&mut self, kind: ArtifactKind) -> Result<Option<PathBuf>> {
        let now = Local::now();
        let (live, target) = match kind {
            ArtifactKind::Catalog => {
                if self.catalog.is_some() {
                    return Ok(None);
                }
                (
                    self.layout.catalog.clone(),
                    self.layout.catalog_archive_path(now),
                )
            }
            ArtifactKind::Image => {
                if self.image.is_some() {
                    return Ok(None);
                }
                let len = std::fs::metadata(&self.layout.staging_image)
                    .map(|m| m.len())
                    .unwrap_or(0);
                if len == 0 {
                    return Ok(None);
                }
                (
                    self.layout.staging_image.clone(),
                    self.layout.recovered_image_path(now),
                )
            }
        };
        if !live.exists() {
            return Ok(None);
        }

        rename_into(&live, &target)?;
        if kind == ArtifactKind::Catalog {
            self.catalog_sequence += 1;
        }
        info!(%kind, from = ?live, to = ?target, "recovered artifact from previous run");
        Ok(Some(target))
    }

    /// Append one image fragment to the staging file.
    pub fn append_image(&mut self, fragment: &[u8]) -> Result<()> {
        self.image
            .as_mut()
            .ok_or(ArchiveError::NotOpen(ArtifactKind::Image))?
            .append(fragment)
    }

    /// Append one entry to the open catalog.
    pub fn append_catalog(&mut self, fragment: &[u8]) -> Result<()> {
        self.catalog
            .as_mut()
            .ok_or(ArchiveError::NotOpen(ArtifactKind::Catalog))?
            .append_entry(fragment)
    }

    /// Start a new catalog round.
    ///
    /// A previous round still on disk (closed, or open with entries) is
    /// archived first; an open catalog with no entries is reused. Returns
    /// the archive path of the previous round, if one was archived.
    pub fn begin_catalog_round(&mut self) -> Result<Option<PathBuf>> {
        if let Some(open) = &self.catalog {
            if open.entry_count() == 0 {
                return Ok(None);
            }
        } else if !self.layout.catalog.exists() {
            self.open_staging(ArtifactKind::Catalog)?;
            return Ok(None);
        }
        self.archive(ArtifactKind::Catalog, None).map(Some)
    }

    /// Close the catalog's root element and the file, leaving it in place.
    ///
    /// Returns `None` if no catalog was open.
    pub fn close_catalog(&mut self) -> Result<Option<PathBuf>> {
        match self.catalog.take() {
            Some(writer) => writer.finalize().map(Some),
            None => Ok(None),
        }
    }

    /// Flush, close and rename the live file for `kind` into the archive,
    /// then recreate an empty live file.
    ///
    /// Images are archived under `explicit_name` (the sender's file name);
    /// catalogs always get a timestamped name.
    pub fn archive(
        &mut self,
        kind: ArtifactKind,
        explicit_name: Option<&OsStr>,
    ) -> Result<PathBuf> {
        let now = Local::now();
        let target = match kind {
            ArtifactKind::Image => {
                let image = self
                    .image
                    .take()
                    .ok_or(ArchiveError::NotOpen(ArtifactKind::Image))?;
                let (staging, size) = image.seal()?;
                let target = self
                    .layout
                    .image_archive_path(explicit_name.unwrap_or_default(), now);
                rename_into(&staging, &target)?;
                info!(path = ?target, bytes = size, "image archived");
                target
            }
            ArtifactKind::Catalog => {
                self.close_catalog()?;
                let target = self.layout.catalog_archive_path(now);
                rename_into(&self.layout.catalog, &target)?;
                self.catalog_sequence += 1;
                info!(path = ?target, sequence = self.catalog_sequence, "catalog archived");
                target
            }
        };
        self.open_staging(kind)?;
        debug!(%kind, "live file recreated");
        Ok(target)
    }

    /// The layout this store writes to.
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// The staging image, if open.
    pub fn image(&self) -> Option<&ImageBuffer> {
        self.image.as_ref()
    }

    /// The live catalog, if open.
    pub fn catalog(&self) -> Option<&CatalogWriter> {
        self.catalog.as_ref()
    }

    /// Number of catalogs archived by this store, recovered ones included.
    pub fn catalog_sequence(&self) -> u64 {
        self.catalog_sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> ArchiveStore {
        ArchiveStore::open(StoreLayout::rooted_at(dir.path())).unwrap()
    }

    #[test]
    fn open_creates_staging_and_archive_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        assert!(store.layout().staging_image.exists());
        assert!(store.layout().catalog_archive_dir().is_dir());
        assert!(store.catalog().is_none());
        assert!(!store.layout().catalog.exists());
    }

    #[test]
    fn archive_image_without_name_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        store.append_image(b"pixels").unwrap();

        let path = store.archive(ArtifactKind::Image, None).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("image_") && name.ends_with(".img"), "{name}");
    }

    #[test]
    fn begin_round_reuses_empty_open_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);

        assert_eq!(store.begin_catalog_round().unwrap(), None);
        assert!(store.catalog().is_some());
        assert_eq!(store.begin_catalog_round().unwrap(), None);
        assert_eq!(store.catalog_sequence(), 0);
    }

    #[test]
    fn begin_round_archives_closed_previous_round() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);

        store.begin_catalog_round().unwrap();
        store.append_catalog(b"<ROEIMAGE>a</ROEIMAGE>").unwrap();
        store.close_catalog().unwrap();
        assert!(store.catalog().is_none());

        let archived = store.begin_catalog_round().unwrap().unwrap();
        assert!(archived.starts_with(store.layout().catalog_archive_dir()));
        assert!(std::fs::read_to_string(&archived).unwrap().contains("<ROEIMAGE>a"));
        assert_eq!(store.catalog().unwrap().entry_count(), 0);
        assert_eq!(store.catalog_sequence(), 1);
    }

    #[test]
    fn append_catalog_without_round_is_not_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let err = store.append_catalog(b"<ROEIMAGE>x").unwrap_err();
        assert!(matches!(err, ArchiveError::NotOpen(ArtifactKind::Catalog)));
    }

    #[test]
    fn close_catalog_when_none_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        assert_eq!(store.close_catalog().unwrap(), None);
    }

    #[test]
    fn empty_leftover_image_is_not_recovered() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::rooted_at(dir.path());
        std::fs::write(&layout.staging_image, b"").unwrap();

        let mut store = ArchiveStore::new(layout);
        assert_eq!(store.recover_existing(ArtifactKind::Image).unwrap(), None);
    }

    #[test]
    fn artifact_kind_display() {
        assert_eq!(ArtifactKind::Image.to_string(), "image");
        assert_eq!(ArtifactKind::Catalog.to_string(), "catalog");
    }
}
