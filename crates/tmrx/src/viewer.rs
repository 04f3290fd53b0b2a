use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tmrx_demux::ArchiveObserver;
use tracing::{debug, warn};

/// Launches an external program on every archived image.
///
/// Children run detached from the receive loop; finished ones are reaped
/// before each new launch so they never pile up as zombies.
pub struct Viewer {
    program: PathBuf,
    children: Vec<Child>,
}

impl Viewer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            children: Vec::new(),
        }
    }

    fn reap(&mut self) {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = child.id(), %status, "viewer exited");
                false
            }
            Ok(None) => true,
            Err(err) => {
                warn!(pid = child.id(), error = %err, "viewer status unavailable");
                false
            }
        });
    }

    #[cfg(test)]
    fn running(&self) -> usize {
        self.children.len()
    }
}

impl ArchiveObserver for Viewer {
    fn image_archived(&mut self, path: &Path) {
        self.reap();
        let spawned = Command::new(&self.program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => {
                debug!(pid = child.id(), path = %path.display(), "viewer started");
                self.children.push(child);
            }
            Err(err) => warn!(
                program = %self.program.display(),
                error = %err,
                "viewer launch failed"
            ),
        }
    }
}
