use tmrx_archive::ArchiveError;
use tmrx_link::LinkError;

/// Conditions that stop the receive loop.
#[derive(Debug, thiserror::Error)]
pub enum DemuxError {
    /// The link failed for a reason other than a shutdown request.
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// Writing or rotating an artifact failed.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// A receive returned no data. With `N_HDLC` this only happens when the
    /// device is misconfigured, so it is not retried.
    #[error("read returned with no data (link misconfigured)")]
    EmptyRead,
}

impl DemuxError {
    /// The OS error code behind this error, if there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            DemuxError::Link(err) => err.raw_os_error(),
            DemuxError::Archive(err) => err.raw_os_error(),
            DemuxError::EmptyRead => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DemuxError>;
