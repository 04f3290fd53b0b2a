use bytes::Bytes;

use crate::error::Result;

/// A framed receive-only link.
///
/// Implementations guarantee that each successful [`Link::receive`] yields
/// exactly one complete link-layer frame, never a partial or coalesced one,
/// and that frames with a bad CRC have already been dropped by hardware.
pub trait Link {
    /// Block until the next frame arrives.
    ///
    /// A zero-length frame is returned as-is; deciding what it means is the
    /// caller's business. Returns [`LinkError::Interrupted`] when a shutdown
    /// request unblocked the call.
    ///
    /// [`LinkError::Interrupted`]: crate::LinkError::Interrupted
    fn receive(&mut self) -> Result<Bytes>;

    /// Running count of frames the hardware rejected for CRC mismatch.
    fn crc_error_count(&mut self) -> Result<u32>;

    /// Drop any session-level modem signals (RTS/DTR). Called on teardown.
    fn deassert_control_lines(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn receive(&mut self) -> Result<Bytes> {
        (**self).receive()
    }

    fn crc_error_count(&mut self) -> Result<u32> {
        (**self).crc_error_count()
    }

    fn deassert_control_lines(&mut self) -> Result<()> {
        (**self).deassert_control_lines()
    }
}
