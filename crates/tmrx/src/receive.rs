use std::path::PathBuf;

use clap::Args;
use tmrx_archive::{ArchiveStore, StoreLayout};
use tmrx_demux::{ArchiveObserver, Demux, DemuxConfig, NoObserver};
use tmrx_link::{Link, DEFAULT_BASE_CLOCK, DEFAULT_DEVICE, DEFAULT_MAX_FRAME_SIZE};
use tmrx_packet::{Classifier, CATALOG_TERMINATOR_LEN, IMAGE_TERMINATOR_LEN};
use tracing::info;

use crate::exit::{archive_error, demux_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_summary, OutputFormat};
use crate::viewer::Viewer;

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// SyncLink device to receive from.
    #[arg(default_value = DEFAULT_DEVICE, env = "TMRX_DEVICE")]
    pub device: PathBuf,

    /// Directory for archived images (catalogs go in its xml_archive/).
    #[arg(long, value_name = "DIR", env = "TMRX_ARCHIVE_DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Staging file for the image currently being received.
    #[arg(long, value_name = "PATH", env = "TMRX_STAGING_IMAGE")]
    pub staging_image: Option<PathBuf>,

    /// Live catalog document.
    #[arg(long, value_name = "PATH", env = "TMRX_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Expect an image, not a catalog, after every catalog terminator.
    #[arg(long)]
    pub recovery: bool,

    /// sync_data staging files after every fragment.
    #[arg(long)]
    pub sync: bool,

    /// Program run as `PROGRAM <archived image>` after every image.
    #[arg(long, value_name = "PROGRAM", env = "TMRX_VIEWER")]
    pub viewer: Option<PathBuf>,

    /// Frame length that terminates an image.
    #[arg(long, value_name = "BYTES", default_value_t = IMAGE_TERMINATOR_LEN)]
    pub image_terminator_len: usize,

    /// Frame length that terminates a catalog round.
    #[arg(long, value_name = "BYTES", default_value_t = CATALOG_TERMINATOR_LEN)]
    pub catalog_terminator_len: usize,

    /// Receive buffer size; longer frames are truncated by the driver.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,

    /// Adapter base clock in Hz.
    #[arg(long, value_name = "HZ", default_value_t = DEFAULT_BASE_CLOCK)]
    pub base_clock: u32,

    /// Keep the adapter's factory base clock.
    #[arg(long, conflicts_with = "base_clock")]
    pub factory_clock: bool,
}

impl ReceiveArgs {
    pub fn validate(&self) -> CliResult<()> {
        if self.image_terminator_len == 0 || self.catalog_terminator_len == 0 {
            return Err(CliError::new(USAGE, "terminator lengths must be non-zero"));
        }
        if self.max_frame_size == 0 {
            return Err(CliError::new(USAGE, "--max-frame-size must be non-zero"));
        }
        Ok(())
    }

    pub fn layout(&self) -> StoreLayout {
        let mut layout = StoreLayout::default();
        if let Some(dir) = &self.archive_dir {
            layout.archive_dir = dir.clone();
        }
        if let Some(path) = &self.staging_image {
            layout.staging_image = path.clone();
        }
        if let Some(path) = &self.catalog {
            layout.catalog = path.clone();
        }
        layout.sync_each_fragment = self.sync;
        layout
    }

    pub fn demux_config(&self) -> DemuxConfig {
        DemuxConfig {
            recovery: self.recovery,
            classifier: Classifier {
                image_terminator_len: self.image_terminator_len,
                catalog_terminator_len: self.catalog_terminator_len,
                ..Classifier::default()
            },
        }
    }
}

pub fn run(args: ReceiveArgs, format: OutputFormat) -> CliResult<i32> {
    args.validate()?;

    tmrx_link::signal::install_interrupt_handler().map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })?;

    let mut link = open_link(&args)?;

    let store = ArchiveStore::open(args.layout())
        .map_err(|err| archive_error("archive store setup failed", err))?;

    let observer: Box<dyn ArchiveObserver> = match &args.viewer {
        Some(program) => Box::new(Viewer::new(program)),
        None => Box::new(NoObserver),
    };

    let mut demux = Demux::with_observer(args.demux_config(), store, observer);
    let result = demux.run(link.as_mut());

    print_summary(&demux.summary(&result), format);

    match result {
        Ok(()) => {
            info!("shutdown complete");
            Ok(SUCCESS)
        }
        Err(err) => Err(demux_error("receive failed", err)),
    }
}

#[cfg(target_os = "linux")]
fn open_link(args: &ReceiveArgs) -> CliResult<Box<dyn Link>> {
    use tmrx_link::{SyncLinkConfig, SyncLinkDevice};

    let config = SyncLinkConfig {
        base_clock: (!args.factory_clock).then_some(args.base_clock),
        max_frame_size: args.max_frame_size,
        ..SyncLinkConfig::default()
    };
    let device = SyncLinkDevice::open_with_config(&args.device, &config)
        .map_err(|err| crate::exit::link_error("device setup failed", err))?;
    Ok(Box::new(device))
}

#[cfg(not(target_os = "linux"))]
fn open_link(args: &ReceiveArgs) -> CliResult<Box<dyn Link>> {
    Err(CliError::new(
        crate::exit::LINK_ERROR,
        format!(
            "{}: SyncLink devices are only supported on Linux",
            args.device.display()
        ),
    ))
}
