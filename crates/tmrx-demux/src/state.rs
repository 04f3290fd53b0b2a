use tmrx_packet::{Expectation, Stream};

/// Where the demultiplexer is in the interleaved image/catalog sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxState {
    /// Nothing received yet; frames go to the image stream.
    AwaitingFirstPacket,
    /// Inside an image.
    WritingImage,
    /// An image just ended; the next fragment's prefix picks the stream.
    AwaitingCatalogOrImage,
    /// Inside a catalog round.
    WritingCatalog,
}

impl DemuxState {
    /// What the classifier may assume about non-terminator frames.
    pub fn expectation(self) -> Expectation {
        match self {
            DemuxState::AwaitingFirstPacket | DemuxState::WritingImage => {
                Expectation::Committed(Stream::Image)
            }
            DemuxState::AwaitingCatalogOrImage => Expectation::Ambiguous,
            DemuxState::WritingCatalog => Expectation::Committed(Stream::Catalog),
        }
    }

    /// Short label for logs and summaries.
    pub fn as_str(self) -> &'static str {
        match self {
            DemuxState::AwaitingFirstPacket => "awaiting-first-packet",
            DemuxState::WritingImage => "writing-image",
            DemuxState::AwaitingCatalogOrImage => "awaiting-catalog-or-image",
            DemuxState::WritingCatalog => "writing-catalog",
        }
    }
}
