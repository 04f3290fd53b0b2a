use std::path::PathBuf;

/// Errors that can occur on the serial link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Failed to open the character device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A device configuration ioctl failed.
    #[error("{op} failed: {source}")]
    Configure {
        op: &'static str,
        source: std::io::Error,
    },

    /// An I/O error occurred while receiving.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking receive was interrupted by a shutdown request.
    #[error("interrupted by user request")]
    Interrupted,
}

impl LinkError {
    /// The OS error code behind this error, if there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            LinkError::Open { source, .. } | LinkError::Configure { source, .. } => {
                source.raw_os_error()
            }
            LinkError::Io(source) => source.raw_os_error(),
            LinkError::Interrupted => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
