use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::warn;

/// Second-resolution stamp used in generated archive names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Where live and archived artifacts live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    /// Live image staging file.
    pub staging_image: PathBuf,
    /// Live catalog document.
    pub catalog: PathBuf,
    /// Archived images land here under their sender-supplied names.
    pub archive_dir: PathBuf,
    /// Archived catalogs land in this subdirectory of `archive_dir`.
    pub catalog_archive_subdir: PathBuf,
    /// `sync_data` after every fragment, not just a flush.
    pub sync_each_fragment: bool,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            staging_image: PathBuf::from("imagebuffer"),
            catalog: PathBuf::from("imageindex.xml"),
            archive_dir: PathBuf::from("images"),
            catalog_archive_subdir: PathBuf::from("xml_archive"),
            sync_each_fragment: false,
        }
    }
}

impl StoreLayout {
    /// Default layout with every path placed under `root`.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let defaults = Self::default();
        Self {
            staging_image: root.join(defaults.staging_image),
            catalog: root.join(defaults.catalog),
            archive_dir: root.join(defaults.archive_dir),
            ..defaults
        }
    }

    /// Directory holding archived catalogs.
    pub fn catalog_archive_dir(&self) -> PathBuf {
        self.archive_dir.join(&self.catalog_archive_subdir)
    }

    /// `<archive>/xml_archive/imageindex_<stamp>.xml`.
    ///
    /// Two rounds archived within the same second get the same name and
    /// the later one replaces the earlier.
    pub fn catalog_archive_path(&self, at: DateTime<Local>) -> PathBuf {
        let stem = self
            .catalog
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("imageindex");
        let ext = self
            .catalog
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("xml");
        self.catalog_archive_dir()
            .join(format!("{}_{}.{}", stem, at.format(TIMESTAMP_FORMAT), ext))
    }

    /// Archive path for an image named by the sender.
    ///
    /// Only the final path component of `sender_name` is used. A name with
    /// nothing usable, or one that would land on a live file, the catalog
    /// archive directory or any other directory, falls back to
    /// `image_<stamp>.img`.
    pub fn image_archive_path(&self, sender_name: &OsStr, at: DateTime<Local>) -> PathBuf {
        let shown = sender_name.to_string_lossy();
        let candidate = match sanitize_name(sender_name) {
            Some(name) => {
                if name != sender_name {
                    warn!(
                        sender_name = %shown,
                        name = %name.to_string_lossy(),
                        "sender file name reduced to its last component"
                    );
                }
                let target = self.archive_dir.join(name);
                if self.is_reserved(&target) {
                    warn!(sender_name = %shown, path = ?target, "sender file name is reserved");
                    None
                } else {
                    Some(target)
                }
            }
            None => {
                warn!(sender_name = %shown, "unusable sender file name");
                None
            }
        };
        candidate.unwrap_or_else(|| {
            self.archive_dir
                .join(format!("image_{}.img", at.format(TIMESTAMP_FORMAT)))
        })
    }

    /// True if archiving to `target` would clobber a live file or hit a
    /// directory.
    fn is_reserved(&self, target: &Path) -> bool {
        target.is_dir()
            || same_path(target, &self.staging_image)
            || same_path(target, &self.catalog)
            || same_path(target, &self.catalog_archive_dir())
    }

    /// Archive path for a staging image left behind by a previous run.
    pub fn recovered_image_path(&self, at: DateTime<Local>) -> PathBuf {
        self.archive_dir
            .join(format!("recovered_{}.img", at.format(TIMESTAMP_FORMAT)))
    }
}

fn sanitize_name(raw: &OsStr) -> Option<&OsStr> {
    Path::new(raw)
        .file_name()
        .filter(|n| !n.to_string_lossy().trim().is_empty())
}

/// Same file on disk when both exist, otherwise the same path once `.`
/// components are dropped.
fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => without_cur_dir(a).eq(without_cur_dir(b)),
    }
}

fn without_cur_dir(path: &Path) -> impl Iterator<Item = Component<'_>> {
    path.components().filter(|c| !matches!(c, Component::CurDir))
}
