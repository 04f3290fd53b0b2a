use std::path::Path;

/// Notified after an artifact has been renamed into the archive.
///
/// Paths passed here are final archive paths, never live staging paths.
/// There is no way to report back into the receive loop.
pub trait ArchiveObserver {
    /// An image was archived at `path`.
    fn image_archived(&mut self, _path: &Path) {}

    /// A catalog round was archived at `path`.
    fn catalog_archived(&mut self, _path: &Path) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoObserver;

impl ArchiveObserver for NoObserver {}

impl<O: ArchiveObserver + ?Sized> ArchiveObserver for Box<O> {
    fn image_archived(&mut self, path: &Path) {
        (**self).image_archived(path)
    }

    fn catalog_archived(&mut self, path: &Path) {
        (**self).catalog_archived(path)
    }
}
