//! Packet classification for the telemetry downlink.
//!
//! The sender interleaves two streams over one link, image data and an XML
//! catalog, and marks the end of each artifact with a terminator packet:
//! - a terminator is recognised by its length alone
//! - a catalog fragment starts with the `<ROEIMAGE>` prefix
//! - anything else belongs to the image stream
//!
//! Content is only sniffed while the receiver has not yet committed to a
//! stream; see [`Expectation`].

pub mod classify;
pub mod packet;

pub use classify::{
    Classifier, Expectation, PacketKind, Stream, CATALOG_PREFIX, CATALOG_TERMINATOR_LEN,
    IMAGE_TERMINATOR_LEN,
};
pub use packet::Packet;
