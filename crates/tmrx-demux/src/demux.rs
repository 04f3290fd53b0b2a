use tmrx_archive::{ArchiveStore, ArtifactKind};
use tmrx_link::{Link, LinkError};
use tmrx_packet::{Classifier, Packet, PacketKind};
use tracing::{debug, error, info, warn};

use crate::counters::RunCounters;
use crate::error::{DemuxError, Result};
use crate::observer::{ArchiveObserver, NoObserver};
use crate::state::DemuxState;
use crate::summary::RunSummary;

/// Receive loop behaviour.
#[derive(Debug, Clone, Default)]
pub struct DemuxConfig {
    /// Start directly in [`DemuxState::WritingImage`] and expect an image,
    /// not a catalog, after each catalog terminator.
    pub recovery: bool,
    /// Terminator lengths and catalog prefix.
    pub classifier: Classifier,
}

impl DemuxConfig {
    fn initial_state(&self) -> DemuxState {
        if self.recovery {
            DemuxState::WritingImage
        } else {
            DemuxState::AwaitingFirstPacket
        }
    }

    fn after_catalog(&self) -> DemuxState {
        if self.recovery {
            DemuxState::WritingImage
        } else {
            DemuxState::AwaitingCatalogOrImage
        }
    }
}

/// The stream demultiplexer: one blocking receive-classify-dispatch loop.
pub struct Demux<O = NoObserver> {
    config: DemuxConfig,
    store: ArchiveStore,
    state: DemuxState,
    counters: RunCounters,
    observer: O,
}

impl Demux<NoObserver> {
    /// Demultiplex into `store` with no archive observer.
    pub fn new(config: DemuxConfig, store: ArchiveStore) -> Self {
        Self::with_observer(config, store, NoObserver)
    }
}

impl<O: ArchiveObserver> Demux<O> {
    /// Demultiplex into `store`, notifying `observer` after each archive.
    pub fn with_observer(config: DemuxConfig, store: ArchiveStore, observer: O) -> Self {
        let state = config.initial_state();
        Self {
            config,
            store,
            state,
            counters: RunCounters::new(),
            observer,
        }
    }

    /// Run until shutdown is requested or a fatal error occurs.
    ///
    /// `Ok(())` means the link reported an interrupt. Either way RTS/DTR are
    /// deasserted before returning; a teardown failure is only reported if
    /// the loop itself ended cleanly.
    pub fn run<L: Link + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        self.sample_crc(link);
        info!(state = self.state.as_str(), "receiving");

        let result = self.receive_loop(link);
        let elapsed = self.counters.health.elapsed().as_secs_f64();
        match &result {
            Ok(()) => info!(elapsed_secs = elapsed, "shutdown requested, stopping"),
            Err(err) => error!(elapsed_secs = elapsed, error = %err, "receiver failed"),
        }

        let teardown = link.deassert_control_lines().map_err(DemuxError::from);
        if let Err(err) = &teardown {
            warn!(error = %err, "teardown failed");
        }
        result.and(teardown)
    }

    fn receive_loop<L: Link + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        loop {
            let payload = match link.receive() {
                Ok(payload) => payload,
                Err(LinkError::Interrupted) => return Ok(()),
                Err(err) => return Err(err.into()),
            };
            if payload.is_empty() {
                return Err(DemuxError::EmptyRead);
            }
            self.sample_crc(link);
            self.handle(&Packet::from(payload))?;
        }
    }

    fn sample_crc<L: Link + ?Sized>(&mut self, link: &mut L) {
        match link.crc_error_count() {
            Ok(count) => {
                let delta = self.counters.health.sample(count);
                if delta > 0 {
                    warn!(
                        delta,
                        total = self.counters.health.crc_failures(),
                        "CRC failed"
                    );
                }
            }
            Err(err) => debug!(error = %err, "CRC counter unavailable"),
        }
    }

    /// Classify one frame and apply it. Returns the classification.
    pub fn handle(&mut self, packet: &Packet) -> Result<PacketKind> {
        let kind = self
            .config
            .classifier
            .classify(&packet.payload, self.state.expectation());
        self.counters.record_packet(packet.len());

        let next = match kind {
            PacketKind::ImageFragment => {
                self.store.append_image(&packet.payload)?;
                self.record_fragment(packet.len());
                DemuxState::WritingImage
            }
            PacketKind::CatalogFragment => {
                if self.state != DemuxState::WritingCatalog {
                    if let Some(previous) = self.store.begin_catalog_round()? {
                        self.counters.catalogs_archived += 1;
                        self.observer.catalog_archived(&previous);
                    }
                }
                self.store.append_catalog(&packet.payload)?;
                self.record_fragment(packet.len());
                DemuxState::WritingCatalog
            }
            PacketKind::ImageTerminator => self.finish_image(packet)?,
            PacketKind::CatalogTerminator => self.finish_catalog()?,
        };

        if next != self.state {
            debug!(
                from = self.state.as_str(),
                to = next.as_str(),
                "state transition"
            );
            self.state = next;
        }
        Ok(kind)
    }

    fn record_fragment(&mut self, len: usize) {
        self.counters.record_fragment(len);
        debug!(
            bytes = len,
            index = self.counters.artifact_packets,
            total = self.counters.artifact_bytes,
            "fragment written"
        );
    }

    fn finish_image(&mut self, packet: &Packet) -> Result<DemuxState> {
        if self.state == DemuxState::WritingCatalog {
            warn!("image terminator inside a catalog round; closing the catalog first");
            self.counters.anomalies += 1;
            if self.store.close_catalog()?.is_some() {
                self.counters.catalogs_closed += 1;
            }
        }

        let name = packet.sender_name();
        let path = self
            .store
            .archive(ArtifactKind::Image, Some(name.as_os_str()))?;
        info!(
            name = %name.to_string_lossy(),
            bytes = self.counters.artifact_bytes,
            fragments = self.counters.artifact_packets,
            "image complete"
        );
        self.counters.images_archived += 1;
        self.counters.reset_artifact();
        self.observer.image_archived(&path);
        Ok(DemuxState::AwaitingCatalogOrImage)
    }

    fn finish_catalog(&mut self) -> Result<DemuxState> {
        if self.state != DemuxState::WritingCatalog {
            warn!(
                state = self.state.as_str(),
                "catalog terminator with no catalog round open; ignored"
            );
            self.counters.anomalies += 1;
            return Ok(self.state);
        }

        if let Some(path) = self.store.close_catalog()? {
            info!(
                path = ?path,
                entries = self.counters.artifact_packets,
                "catalog round closed"
            );
            self.counters.catalogs_closed += 1;
        }
        self.counters.reset_artifact();
        Ok(self.config.after_catalog())
    }

    /// Current state.
    pub fn state(&self) -> DemuxState {
        self.state
    }

    /// Counters so far.
    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    /// The archive store.
    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// The observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Build the end-of-run report for `result`, as returned by [`Demux::run`].
    pub fn summary(&self, result: &Result<()>) -> RunSummary {
        let reason = match result {
            Ok(()) => "interrupted".to_string(),
            Err(err) => err.to_string(),
        };
        RunSummary::from_counters(&self.counters, self.state, reason)
    }
}
