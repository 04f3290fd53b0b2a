//! Receive loop and stream demultiplexer.
//!
//! [`Demux`] pulls frames from a [`tmrx_link::Link`], classifies them and
//! routes them into the [`tmrx_archive::ArchiveStore`], driving the
//! four-state machine in [`DemuxState`]. Link health (CRC failure deltas,
//! runtime) is tracked alongside in [`RunCounters`].

pub mod counters;
pub mod demux;
pub mod error;
pub mod health;
pub mod observer;
pub mod state;
pub mod summary;

pub use counters::RunCounters;
pub use demux::{Demux, DemuxConfig};
pub use error::{DemuxError, Result};
pub use health::LinkHealth;
pub use observer::{ArchiveObserver, NoObserver};
pub use state::DemuxState;
pub use summary::RunSummary;
