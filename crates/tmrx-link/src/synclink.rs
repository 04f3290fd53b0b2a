use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::{LinkError, Result};
use crate::params::{
    MgslIcount, MgslParams, MGSL_IOCGPARAMS, MGSL_IOCGSTATS, MGSL_IOCRXENABLE, MGSL_IOCSPARAMS,
    N_HDLC, RX_ENABLE_HUNT,
};
use crate::signal::wait_readable;
use crate::traits::Link;
use crate::{DEFAULT_BASE_CLOCK, DEFAULT_MAX_FRAME_SIZE};

/// One-shot hardware setup for a SyncLink adapter.
#[derive(Debug, Clone)]
pub struct SyncLinkConfig {
    /// Custom base clock in Hz. `None` keeps the factory 14.7456 MHz clock.
    pub base_clock: Option<u32>,
    /// Receive buffer size; frames longer than this are truncated by the driver.
    pub max_frame_size: usize,
    /// Argument passed to `MGSL_IOCRXENABLE`.
    pub rx_enable: libc::c_ulong,
}

impl Default for SyncLinkConfig {
    fn default() -> Self {
        Self {
            base_clock: Some(DEFAULT_BASE_CLOCK),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            rx_enable: RX_ENABLE_HUNT,
        }
    }
}

/// An open, configured SyncLink adapter running the `N_HDLC` line discipline.
///
/// With `N_HDLC` installed each `read(2)` returns exactly one received frame,
/// already CRC-checked by the adapter.
pub struct SyncLinkDevice {
    file: File,
    path: PathBuf,
    buf: Vec<u8>,
    lines_asserted: bool,
}

impl SyncLinkDevice {
    /// Open and configure a device with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, &SyncLinkConfig::default())
    }

    /// Open and configure a device.
    ///
    /// The device is opened non-blocking so a missing DCD does not hang the
    /// open, then switched to blocking once configured.
    pub fn open_with_config(path: impl AsRef<Path>, config: &SyncLinkConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .map_err(|source| LinkError::Open {
                path: path.clone(),
                source,
            })?;
        info!(?path, "device opened");

        let mut device = Self {
            file,
            path,
            buf: vec![0u8; config.max_frame_size],
            lines_asserted: false,
        };
        device.configure(config)?;
        Ok(device)
    }

    fn configure(&mut self, config: &SyncLinkConfig) -> Result<()> {
        let fd = self.file.as_raw_fd();

        let ldisc: libc::c_int = N_HDLC;
        // SAFETY: `fd` is open for the lifetime of `self.file`; TIOCSETD reads one
        // `c_int` through the pointer, which stays valid for the call.
        check("set line discipline", unsafe {
            libc::ioctl(fd, libc::TIOCSETD as _, &ldisc)
        })?;

        if let Some(freq) = config.base_clock {
            let clock = MgslParams::base_clock(freq);
            // SAFETY: MGSL_IOCSPARAMS reads one `MgslParams` (repr(C), driver layout).
            check("set base clock", unsafe {
                libc::ioctl(fd, MGSL_IOCSPARAMS as _, &clock)
            })?;
            debug!(freq, "base clock programmed");
        }

        let mut params = MgslParams::default();
        // SAFETY: MGSL_IOCGPARAMS writes one `MgslParams` into the writable local.
        check("MGSL_IOCGPARAMS", unsafe {
            libc::ioctl(fd, MGSL_IOCGPARAMS as _, &mut params)
        })?;
        params.apply_hdlc_receive();
        // SAFETY: as above, the driver only reads the parameter block.
        check("MGSL_IOCSPARAMS", unsafe {
            libc::ioctl(fd, MGSL_IOCSPARAMS as _, &params)
        })?;

        let lines: libc::c_int = libc::TIOCM_RTS | libc::TIOCM_DTR;
        // SAFETY: TIOCMBIS reads one `c_int` bit mask.
        check("assert RTS/DTR", unsafe {
            libc::ioctl(fd, libc::TIOCMBIS as _, &lines)
        })?;
        self.lines_asserted = true;

        // SAFETY: plain fcntl flag query/update on an owned descriptor.
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        check("F_GETFL", flags)?;
        // SAFETY: as above.
        check("F_SETFL", unsafe {
            libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK)
        })?;

        // SAFETY: MGSL_IOCRXENABLE takes its argument by value.
        check("enable receiver", unsafe {
            libc::ioctl(fd, MGSL_IOCRXENABLE as _, config.rx_enable)
        })?;

        info!(path = ?self.path, "device configured for HDLC receive");
        Ok(())
    }

    /// The device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn set_control_lines(&mut self, on: bool) -> Result<()> {
        let lines: libc::c_int = libc::TIOCM_RTS | libc::TIOCM_DTR;
        let (request, op) = if on {
            (libc::TIOCMBIS, "assert RTS/DTR")
        } else {
            (libc::TIOCMBIC, "negate RTS/DTR")
        };
        // SAFETY: TIOCMBIS/TIOCMBIC read one `c_int` bit mask.
        check(op, unsafe {
            libc::ioctl(self.file.as_raw_fd(), request as _, &lines)
        })?;
        self.lines_asserted = on;
        Ok(())
    }
}

impl Link for SyncLinkDevice {
    fn receive(&mut self) -> Result<Bytes> {
        loop {
            if !wait_readable(self.file.as_raw_fd())? {
                return Err(LinkError::Interrupted);
            }
            match self.file.read(&mut self.buf) {
                Ok(n) => return Ok(Bytes::copy_from_slice(&self.buf[..n])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(LinkError::Io(err)),
            }
        }
    }

    fn crc_error_count(&mut self) -> Result<u32> {
        let mut icount = MgslIcount::default();
        // SAFETY: MGSL_IOCGSTATS writes one `MgslIcount` into the writable local.
        check("MGSL_IOCGSTATS", unsafe {
            libc::ioctl(self.file.as_raw_fd(), MGSL_IOCGSTATS as _, &mut icount)
        })?;
        Ok(icount.rxcrc)
    }

    fn deassert_control_lines(&mut self) -> Result<()> {
        if !self.lines_asserted {
            return Ok(());
        }
        info!("turning off RTS and DTR");
        self.set_control_lines(false)
    }
}

impl Drop for SyncLinkDevice {
    fn drop(&mut self) {
        if self.lines_asserted {
            if let Err(err) = self.set_control_lines(false) {
                warn!(path = ?self.path, error = %err, "failed to negate RTS/DTR on drop");
            }
        }
    }
}

impl std::fmt::Debug for SyncLinkDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncLinkDevice")
            .field("path", &self.path)
            .field("lines_asserted", &self.lines_asserted)
            .finish()
    }
}

fn check(op: &'static str, rc: libc::c_int) -> Result<()> {
    if rc < 0 {
        Err(LinkError::Configure {
            op,
            source: std::io::Error::last_os_error(),
        })
    } else {
        Ok(())
    }
}
