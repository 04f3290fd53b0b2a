use crate::health::LinkHealth;

/// Process-lifetime counters, owned by the demultiplexer.
///
/// `artifact_*` fields describe the artifact currently being written and
/// reset on every terminator that completes one; the rest only grow.
#[derive(Debug, Clone, Default)]
pub struct RunCounters {
    /// CRC baseline and runtime clock.
    pub health: LinkHealth,
    /// Bytes appended to the current artifact.
    pub artifact_bytes: u64,
    /// Fragments appended to the current artifact.
    pub artifact_packets: u64,
    /// Frames received, terminators included.
    pub packets_received: u64,
    /// Payload bytes received, terminators included.
    pub bytes_received: u64,
    /// Images renamed into the archive.
    pub images_archived: u64,
    /// Catalog rounds closed by a terminator.
    pub catalogs_closed: u64,
    /// Catalogs renamed into the archive.
    pub catalogs_archived: u64,
    /// Terminators that arrived in a state with nothing to terminate.
    pub anomalies: u64,
}

impl RunCounters {
    /// Fresh counters with the runtime clock started now.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_packet(&mut self, len: usize) {
        self.packets_received += 1;
        self.bytes_received += len as u64;
    }

    pub(crate) fn record_fragment(&mut self, len: usize) {
        self.artifact_bytes += len as u64;
        self.artifact_packets += 1;
    }

    pub(crate) fn reset_artifact(&mut self) {
        self.artifact_bytes = 0;
        self.artifact_packets = 0;
    }
}
