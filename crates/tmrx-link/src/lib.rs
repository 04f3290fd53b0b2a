//! Synchronous serial link boundary.
//!
//! The receiver core only ever sees the [`Link`] trait: one blocking call
//! that yields exactly one hardware-checked HDLC frame, and a diagnostic
//! CRC failure counter. Everything about opening and programming the
//! adapter lives behind it:
//! - [`SyncLinkDevice`] drives a Microgate SyncLink adapter (Linux)
//! - [`signal`] installs the interrupt latch that unblocks a pending receive

pub mod error;
pub mod signal;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod params;
#[cfg(target_os = "linux")]
pub mod synclink;

pub use error::{LinkError, Result};
pub use traits::Link;

#[cfg(target_os = "linux")]
pub use synclink::{SyncLinkConfig, SyncLinkDevice};

/// Device used when none is given on the command line.
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Largest frame the receiver accepts in one read.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4_194_300;

/// Base clock fitted to the flight ground-station adapters.
pub const DEFAULT_BASE_CLOCK: u32 = 32_000_000;
