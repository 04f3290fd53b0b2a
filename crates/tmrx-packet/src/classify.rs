use tracing::trace;

/// Length of an image terminator frame.
pub const IMAGE_TERMINATOR_LEN: usize = 16;

/// Length of a catalog terminator frame.
pub const CATALOG_TERMINATOR_LEN: usize = 14;

/// Prefix that opens every catalog fragment.
pub const CATALOG_PREFIX: &[u8; 10] = b"<ROEIMAGE>";

/// What a received frame means to the demultiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// End of the current image; the frame carries the archive file name.
    ImageTerminator,
    /// End of the current catalog round.
    CatalogTerminator,
    /// XML catalog content.
    CatalogFragment,
    /// Image payload bytes.
    ImageFragment,
}

impl PacketKind {
    /// Short label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            PacketKind::ImageTerminator => "image-terminator",
            PacketKind::CatalogTerminator => "catalog-terminator",
            PacketKind::CatalogFragment => "catalog-fragment",
            PacketKind::ImageFragment => "image-fragment",
        }
    }
}

/// The two artifact streams multiplexed on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Image,
    Catalog,
}

/// How much the receiver already knows about the next non-terminator frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// Either stream may start here; sniff the content prefix.
    Ambiguous,
    /// The receiver is inside one stream; content is not inspected.
    Committed(Stream),
}

/// Length-then-content packet classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    /// Frame length that marks an image terminator.
    pub image_terminator_len: usize,
    /// Frame length that marks a catalog terminator.
    pub catalog_terminator_len: usize,
    /// Prefix that identifies the first catalog fragment.
    pub catalog_prefix: Vec<u8>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            image_terminator_len: IMAGE_TERMINATOR_LEN,
            catalog_terminator_len: CATALOG_TERMINATOR_LEN,
            catalog_prefix: CATALOG_PREFIX.to_vec(),
        }
    }
}

impl Classifier {
    /// Classify one frame.
    ///
    /// Terminator lengths always win, whatever the frame contains. If both
    /// terminator lengths are configured equal, the image terminator wins.
    pub fn classify(&self, payload: &[u8], expect: Expectation) -> PacketKind {
        let len = payload.len();
        let kind = if len == self.image_terminator_len {
            PacketKind::ImageTerminator
        } else if len == self.catalog_terminator_len {
            PacketKind::CatalogTerminator
        } else {
            match expect {
                Expectation::Committed(Stream::Image) => PacketKind::ImageFragment,
                Expectation::Committed(Stream::Catalog) => PacketKind::CatalogFragment,
                Expectation::Ambiguous if self.has_catalog_prefix(payload) => {
                    PacketKind::CatalogFragment
                }
                Expectation::Ambiguous => PacketKind::ImageFragment,
            }
        };
        trace!(len, ?expect, kind = kind.as_str(), "classified packet");
        kind
    }

    fn has_catalog_prefix(&self, payload: &[u8]) -> bool {
        !self.catalog_prefix.is_empty() && payload.starts_with(&self.catalog_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_EXPECTATIONS: [Expectation; 3] = [
        Expectation::Ambiguous,
        Expectation::Committed(Stream::Image),
        Expectation::Committed(Stream::Catalog),
    ];

    fn padded(prefix: &[u8], len: usize) -> Vec<u8> {
        let mut buf = prefix.to_vec();
        buf.resize(len, b'x');
        buf.truncate(len);
        buf
    }

    #[test]
    fn image_terminator_length_wins_over_content() {
        let c = Classifier::default();
        let contents: [&[u8]; 4] = [b"", b"foo.png", CATALOG_PREFIX, &[0xff; 16]];
        for content in contents {
            let frame = padded(content, IMAGE_TERMINATOR_LEN);
            for expect in ALL_EXPECTATIONS {
                assert_eq!(c.classify(&frame, expect), PacketKind::ImageTerminator);
            }
        }
    }

    #[test]
    fn catalog_terminator_length_wins_over_content() {
        let c = Classifier::default();
        let contents: [&[u8]; 3] = [b"", CATALOG_PREFIX, &[0u8; 14]];
        for content in contents {
            let frame = padded(content, CATALOG_TERMINATOR_LEN);
            for expect in ALL_EXPECTATIONS {
                assert_eq!(c.classify(&frame, expect), PacketKind::CatalogTerminator);
            }
        }
    }

    #[test]
    fn ambiguous_sniffs_prefix() {
        let c = Classifier::default();
        let catalog = padded(CATALOG_PREFIX, 120);
        let image = padded(b"<ROEIMAGX>", 120);

        assert_eq!(
            c.classify(&catalog, Expectation::Ambiguous),
            PacketKind::CatalogFragment
        );
        assert_eq!(
            c.classify(&image, Expectation::Ambiguous),
            PacketKind::ImageFragment
        );
    }

    #[test]
    fn ambiguous_short_frame_cannot_match_prefix() {
        let c = Classifier::default();
        assert_eq!(
            c.classify(b"<ROEIM", Expectation::Ambiguous),
            PacketKind::ImageFragment
        );
    }

    #[test]
    fn committed_image_ignores_catalog_prefix() {
        let c = Classifier::default();
        let frame = padded(CATALOG_PREFIX, 4096);
        assert_eq!(
            c.classify(&frame, Expectation::Committed(Stream::Image)),
            PacketKind::ImageFragment
        );
    }

    #[test]
    fn committed_catalog_accepts_any_content() {
        let c = Classifier::default();
        assert_eq!(
            c.classify(b"  <size>1024</size>\n", Expectation::Committed(Stream::Catalog)),
            PacketKind::CatalogFragment
        );
    }

    #[test]
    fn custom_lengths() {
        let c = Classifier {
            image_terminator_len: 5,
            catalog_terminator_len: 6,
            ..Classifier::default()
        };
        assert_eq!(
            c.classify(b"12345", Expectation::Ambiguous),
            PacketKind::ImageTerminator
        );
        assert_eq!(
            c.classify(b"123456", Expectation::Ambiguous),
            PacketKind::CatalogTerminator
        );
        assert_eq!(
            c.classify(&padded(b"x", IMAGE_TERMINATOR_LEN), Expectation::Ambiguous),
            PacketKind::ImageFragment
        );
    }

    #[test]
    fn kind_labels() {
        assert_eq!(PacketKind::ImageTerminator.as_str(), "image-terminator");
        assert_eq!(PacketKind::CatalogFragment.as_str(), "catalog-fragment");
    }
}
