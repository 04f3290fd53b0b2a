use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tmrx_archive::{ArchiveStore, StoreLayout};
use tmrx_demux::{ArchiveObserver, Demux, DemuxConfig, DemuxError, DemuxState};
use tmrx_link::{Link, LinkError};
use tmrx_packet::{CATALOG_TERMINATOR_LEN, IMAGE_TERMINATOR_LEN};

/// In-memory link that replays a fixed script, then reports an interrupt.
struct ScriptedLink {
    frames: VecDeque<Result<Bytes, LinkError>>,
    crc_counts: VecDeque<u32>,
    last_crc: u32,
    deasserted: bool,
}

impl ScriptedLink {
    fn new(frames: Vec<Result<Bytes, LinkError>>) -> Self {
        Self {
            frames: frames.into(),
            crc_counts: VecDeque::new(),
            last_crc: 0,
            deasserted: false,
        }
    }

    fn with_crc_counts(mut self, counts: &[u32]) -> Self {
        self.crc_counts = counts.iter().copied().collect();
        self
    }
}

impl Link for ScriptedLink {
    fn receive(&mut self) -> tmrx_link::Result<Bytes> {
        self.frames.pop_front().unwrap_or(Err(LinkError::Interrupted))
    }

    fn crc_error_count(&mut self) -> tmrx_link::Result<u32> {
        if let Some(count) = self.crc_counts.pop_front() {
            self.last_crc = count;
        }
        Ok(self.last_crc)
    }

    fn deassert_control_lines(&mut self) -> tmrx_link::Result<()> {
        self.deasserted = true;
        Ok(())
    }
}

#[derive(Default)]
struct Recorder {
    images: Vec<PathBuf>,
    catalogs: Vec<PathBuf>,
}

impl ArchiveObserver for Recorder {
    fn image_archived(&mut self, path: &Path) {
        self.images.push(path.to_path_buf());
    }

    fn catalog_archived(&mut self, path: &Path) {
        self.catalogs.push(path.to_path_buf());
    }
}

fn frame(bytes: &[u8]) -> Result<Bytes, LinkError> {
    Ok(Bytes::copy_from_slice(bytes))
}

fn image_terminator(name: &str) -> Result<Bytes, LinkError> {
    let mut buf = name.as_bytes().to_vec();
    buf.resize(IMAGE_TERMINATOR_LEN, 0);
    Ok(Bytes::from(buf))
}

fn catalog_terminator() -> Result<Bytes, LinkError> {
    Ok(Bytes::from(vec![0u8; CATALOG_TERMINATOR_LEN]))
}

fn demux_in(dir: &tempfile::TempDir) -> Demux<Recorder> {
    let store = ArchiveStore::open(StoreLayout::rooted_at(dir.path())).unwrap();
    Demux::with_observer(DemuxConfig::default(), store, Recorder::default())
}

#[test]
fn two_fragments_then_terminator_archive_one_image() {
    let dir = tempfile::tempdir().unwrap();
    let mut demux = demux_in(&dir);
    let mut link = ScriptedLink::new(vec![
        frame(&[0x11; 100]),
        frame(&[0x22; 50]),
        image_terminator("foo.png"),
    ]);

    demux.run(&mut link).unwrap();

    let layout = demux.store().layout().clone();
    let archived = layout.archive_dir.join("foo.png");
    let bytes = std::fs::read(&archived).unwrap();
    assert_eq!(bytes.len(), 150);
    assert_eq!(&bytes[..100], &[0x11u8; 100][..]);
    assert_eq!(std::fs::metadata(&layout.staging_image).unwrap().len(), 0);
    assert_eq!(demux.counters().artifact_bytes, 0);
    assert_eq!(demux.counters().artifact_packets, 0);
    assert_eq!(demux.counters().images_archived, 1);
    assert_eq!(demux.observer().images, vec![archived]);
    assert!(link.deasserted);
}

#[test]
fn catalog_round_then_next_round_archives_previous() {
    let dir = tempfile::tempdir().unwrap();
    let mut demux = demux_in(&dir);
    let mut link = ScriptedLink::new(vec![
        image_terminator("a.roe"),
        frame(b"<ROEIMAGE>entry1</ROEIMAGE>"),
        catalog_terminator(),
    ]);

    demux.run(&mut link).unwrap();
    assert_eq!(demux.state(), DemuxState::AwaitingCatalogOrImage);

    let live = demux.store().layout().catalog.clone();
    let text = std::fs::read_to_string(&live).unwrap();
    let doc = roxmltree::Document::parse(&text).unwrap();
    let entries = doc
        .root_element()
        .children()
        .filter(|n| n.is_element())
        .count();
    assert_eq!(entries, 1);
    assert!(demux.observer().catalogs.is_empty());

    let mut link = ScriptedLink::new(vec![frame(b"<ROEIMAGE>entry2</ROEIMAGE>")]);
    demux.run(&mut link).unwrap();

    let catalogs = &demux.observer().catalogs;
    assert_eq!(catalogs.len(), 1);
    assert!(catalogs[0].starts_with(demux.store().layout().catalog_archive_dir()));
    let name = catalogs[0].file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("imageindex_") && name.ends_with(".xml"), "{name}");
    assert_eq!(std::fs::read_to_string(&catalogs[0]).unwrap(), text);

    let fresh = std::fs::read_to_string(&live).unwrap();
    assert!(fresh.contains("entry2"));
    assert!(!fresh.contains("entry1"));
}

#[test]
fn catalog_is_well_formed_between_every_append() {
    let dir = tempfile::tempdir().unwrap();
    let mut demux = demux_in(&dir);
    let live = demux.store().layout().catalog.clone();

    let mut link = ScriptedLink::new(vec![image_terminator("a.roe")]);
    demux.run(&mut link).unwrap();

    for i in 0..4 {
        let entry = format!("<ROEIMAGE><frame>{i}</frame></ROEIMAGE>");
        let mut link = ScriptedLink::new(vec![frame(entry.as_bytes())]);
        demux.run(&mut link).unwrap();
        let text = std::fs::read_to_string(&live).unwrap();
        roxmltree::Document::parse(&text).expect("catalog must parse at rest");
    }
}

#[test]
fn zero_length_read_is_fatal_and_still_tears_down() {
    let dir = tempfile::tempdir().unwrap();
    let mut demux = demux_in(&dir);
    let mut link = ScriptedLink::new(vec![frame(&[1u8; 20]), frame(b"")]);

    let result = demux.run(&mut link);

    assert!(matches!(result, Err(DemuxError::EmptyRead)));
    assert!(link.deasserted);
    let summary = demux.summary(&result);
    assert_eq!(summary.packets_received, 1);
    assert!(summary.exit_reason.contains("no data"));
}

#[test]
fn link_error_is_fatal_with_errno() {
    let dir = tempfile::tempdir().unwrap();
    let mut demux = demux_in(&dir);
    let mut link = ScriptedLink::new(vec![Err(LinkError::Io(
        std::io::Error::from_raw_os_error(5),
    ))]);

    let err = demux.run(&mut link).unwrap_err();
    assert!(matches!(err, DemuxError::Link(LinkError::Io(_))));
    assert_eq!(err.raw_os_error(), Some(5));
}

#[test]
fn back_to_back_terminators_archive_empty_image() {
    let dir = tempfile::tempdir().unwrap();
    let mut demux = demux_in(&dir);
    let mut link = ScriptedLink::new(vec![
        frame(&[3u8; 64]),
        image_terminator("first.roe"),
        image_terminator("second.roe"),
    ]);

    demux.run(&mut link).unwrap();

    let archive_dir = &demux.store().layout().archive_dir;
    assert_eq!(std::fs::metadata(archive_dir.join("first.roe")).unwrap().len(), 64);
    assert_eq!(std::fs::metadata(archive_dir.join("second.roe")).unwrap().len(), 0);
    assert_eq!(demux.state(), DemuxState::AwaitingCatalogOrImage);
}

#[test]
fn terminator_naming_a_directory_keeps_receiving() {
    let dir = tempfile::tempdir().unwrap();
    let mut demux = demux_in(&dir);
    let mut link = ScriptedLink::new(vec![
        frame(&[4u8; 40]),
        image_terminator("xml_archive"),
        frame(&[6u8; 20]),
        image_terminator("next.roe"),
    ]);

    demux.run(&mut link).unwrap();

    assert_eq!(demux.counters().images_archived, 2);
    let images = &demux.observer().images;
    assert_eq!(std::fs::metadata(&images[0]).unwrap().len(), 40);
    assert!(demux.store().layout().catalog_archive_dir().is_dir());
    let archive_dir = &demux.store().layout().archive_dir;
    assert_eq!(std::fs::metadata(archive_dir.join("next.roe")).unwrap().len(), 20);
}

#[test]
fn crc_deltas_are_counted_but_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut demux = demux_in(&dir);
    let mut link = ScriptedLink::new(vec![
        frame(&[1u8; 30]),
        frame(&[2u8; 30]),
        frame(&[3u8; 30]),
    ])
    .with_crc_counts(&[7, 7, 9, 12]);

    demux.run(&mut link).unwrap();

    assert_eq!(demux.counters().health.crc_failures(), 5);
    assert_eq!(demux.counters().artifact_bytes, 90);
    assert_eq!(demux.summary(&Ok(())).crc_failures, 5);
}

#[test]
fn observer_never_sees_staging_paths() {
    let dir = tempfile::tempdir().unwrap();
    let mut demux = demux_in(&dir);
    let mut link = ScriptedLink::new(vec![
        frame(&[1u8; 30]),
        image_terminator("x.roe"),
        frame(b"<ROEIMAGE>e</ROEIMAGE>"),
        catalog_terminator(),
        image_terminator("y.roe"),
        frame(b"<ROEIMAGE>f</ROEIMAGE>"),
    ]);

    demux.run(&mut link).unwrap();

    let layout = demux.store().layout().clone();
    let observer = demux.observer();
    assert_eq!(observer.images.len(), 2);
    assert_eq!(observer.catalogs.len(), 1);
    for path in observer.images.iter().chain(observer.catalogs.iter()) {
        assert_ne!(path, &layout.staging_image);
        assert_ne!(path, &layout.catalog);
        assert!(path.exists());
    }
}

#[test]
fn summary_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut demux = demux_in(&dir);
    let mut link = ScriptedLink::new(vec![frame(&[1u8; 30])]);
    let result = demux.run(&mut link);

    let json = serde_json::to_value(demux.summary(&result)).unwrap();
    assert_eq!(json["packets_received"], 1);
    assert_eq!(json["exit_reason"], "interrupted");
    assert_eq!(json["final_state"], "writing-image");
}
