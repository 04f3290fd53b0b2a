use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::error::{ArchiveError, Result};

/// Write all of `buf`, reporting a stall as [`ArchiveError::PartialWrite`].
pub(crate) fn write_fully(file: &mut File, path: &Path, buf: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < buf.len() {
        match file.write(&buf[offset..]) {
            Ok(0) => {
                return Err(ArchiveError::PartialWrite {
                    path: path.to_path_buf(),
                    written: offset,
                    expected: buf.len(),
                })
            }
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(ArchiveError::Write {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
    Ok(())
}

/// Push written bytes to the kernel, and to the device when `sync` is set.
pub(crate) fn flush(file: &mut File, path: &Path, sync: bool) -> Result<()> {
    let to_err = |source| ArchiveError::Flush {
        path: path.to_path_buf(),
        source,
    };
    file.flush().map_err(to_err)?;
    if sync {
        file.sync_data().map_err(to_err)?;
    }
    Ok(())
}

/// Create (or truncate) a live file, creating its parent directory if needed.
pub(crate) fn create_truncated(path: &Path) -> Result<File> {
    let to_err = |source| ArchiveError::Create {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_err)?;
    }
    File::create(path).map_err(to_err)
}

/// Rename `from` to `to`, creating the target directory if needed.
pub(crate) fn rename_into(from: &Path, to: &Path) -> Result<()> {
    let to_err = |source| ArchiveError::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_err)?;
    }
    std::fs::rename(from, to).map_err(to_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_truncated_makes_parent_and_empties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("live.bin");

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"stale").unwrap();

        let mut file = create_truncated(&path).unwrap();
        write_fully(&mut file, &path, b"ok").unwrap();
        flush(&mut file, &path, true).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"ok");
    }

    #[test]
    fn rename_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a");
        let to = dir.path().join("deep").join("er").join("b");
        std::fs::write(&from, b"x").unwrap();

        rename_into(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read(&to).unwrap(), b"x");
    }

    #[test]
    fn rename_missing_source_is_rename_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = rename_into(&dir.path().join("nope"), &dir.path().join("b")).unwrap_err();
        assert!(matches!(err, ArchiveError::Rename { .. }));
        assert_eq!(err.raw_os_error(), Some(2));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn write_to_full_device_is_reported() {
        let path = Path::new("/dev/full");
        let Ok(mut file) = std::fs::OpenOptions::new().write(true).open(path) else {
            return;
        };
        let err = write_fully(&mut file, path, b"data").unwrap_err();
        assert!(matches!(err, ArchiveError::Write { .. }));
    }
}
