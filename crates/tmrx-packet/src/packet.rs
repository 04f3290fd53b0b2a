use std::ffi::OsString;

use bytes::Bytes;

/// One link-layer frame as received. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// The frame contents.
    pub payload: Bytes,
}

impl Packet {
    /// Wrap a received frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Frame length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True for a zero-length frame.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The file name carried by an image terminator.
    ///
    /// The name runs up to the first NUL byte or the end of the frame. On
    /// unix the bytes are kept as they are, UTF-8 or not; sanitising the
    /// result is up to the store.
    pub fn sender_name(&self) -> OsString {
        let raw = self.payload.as_ref();
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        name_from_bytes(&raw[..end])
    }
}

impl From<Bytes> for Packet {
    fn from(payload: Bytes) -> Self {
        Self { payload }
    }
}

#[cfg(unix)]
fn name_from_bytes(raw: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    std::ffi::OsStr::from_bytes(raw).to_os_string()
}

#[cfg(not(unix))]
fn name_from_bytes(raw: &[u8]) -> OsString {
    String::from_utf8_lossy(raw).into_owned().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_name_stops_at_first_nul() {
        let packet = Packet::new(Bytes::from_static(b"foo.png\0\0\0\0\0\0\0\0\0"));
        assert_eq!(packet.len(), 16);
        assert_eq!(packet.sender_name(), "foo.png");
    }

    #[test]
    fn sender_name_uses_whole_frame_without_nul() {
        let packet = Packet::new(Bytes::from_static(b"frame_0042.roe16"));
        assert_eq!(packet.sender_name(), "frame_0042.roe16");
    }

    #[test]
    fn sender_name_of_all_nul_frame_is_empty() {
        let packet = Packet::new(vec![0u8; 16]);
        assert_eq!(packet.sender_name(), "");
    }

    #[test]
    fn empty_frame() {
        let packet = Packet::new(Bytes::new());
        assert!(packet.is_empty());
        assert_eq!(packet.sender_name(), "");
    }

    #[test]
    #[cfg(unix)]
    fn non_utf8_sender_name_is_kept_byte_for_byte() {
        use std::os::unix::ffi::OsStrExt;

        let packet = Packet::new(Bytes::from_static(b"img_\xe9t\xff.roe\0\0\0\0\0"));
        assert_eq!(packet.len(), 16);
        assert_eq!(packet.sender_name().as_bytes(), b"img_\xe9t\xff.roe");
    }
}
