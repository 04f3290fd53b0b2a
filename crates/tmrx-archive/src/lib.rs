//! On-disk lifecycle of received artifacts.
//!
//! Exactly two live files exist while the receiver runs: the staging image
//! and the XML catalog. Completed artifacts are flushed, closed and renamed
//! into the archive directory, and the live path is recreated immediately,
//! so a crash loses at most the artifact in flight and never an archived one.
//!
//! The catalog is kept well-formed at every rest point; see [`CatalogWriter`].

pub mod catalog;
pub mod error;
pub mod image;
pub mod layout;
pub mod store;

mod write;

pub use catalog::{CatalogWriter, CATALOG_CLOSE, CATALOG_OPEN, XML_DECLARATION};
pub use error::{ArchiveError, Result};
pub use image::ImageBuffer;
pub use layout::{StoreLayout, TIMESTAMP_FORMAT};
pub use store::{ArchiveStore, ArtifactKind};
