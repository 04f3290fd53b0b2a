use std::fmt;

use tmrx_archive::ArchiveError;
use tmrx_demux::DemuxError;
use tmrx_link::LinkError;

// Exit codes. Errors that carry an OS errno exit with that errno instead.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const LINK_ERROR: i32 = 3;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn errno_or(errno: Option<i32>, fallback: i32) -> i32 {
    errno.filter(|&code| code > 0).unwrap_or(fallback)
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    let code = match &err {
        LinkError::Interrupted => SUCCESS,
        other => errno_or(other.raw_os_error(), LINK_ERROR),
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn archive_error(context: &str, err: ArchiveError) -> CliError {
    let code = errno_or(err.raw_os_error(), INTERNAL);
    CliError::new(code, format!("{context}: {err}"))
}

pub fn demux_error(context: &str, err: DemuxError) -> CliError {
    match err {
        DemuxError::Link(err) => link_error(context, err),
        DemuxError::Archive(err) => archive_error(context, err),
        DemuxError::EmptyRead => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}
