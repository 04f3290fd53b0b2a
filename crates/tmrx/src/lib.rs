//! Telemetry downlink receiver.
//!
//! Receives HDLC frames from a SyncLink adapter and demultiplexes them into
//! archived image files and a rolling XML catalog.
//!
//! # Crate Structure
//!
//! - [`link`] — Serial link boundary and the SyncLink device
//! - [`packet`] — Terminator/catalog/image classification
//! - [`archive`] — Staging files, catalog writer and archive rotation
//! - [`demux`] — The receive loop and its state machine

/// Re-export link types.
pub mod link {
    pub use tmrx_link::*;
}

/// Re-export packet types.
pub mod packet {
    pub use tmrx_packet::*;
}

/// Re-export archive types.
pub mod archive {
    pub use tmrx_archive::*;
}

/// Re-export demultiplexer types.
pub mod demux {
    pub use tmrx_demux::*;
}
