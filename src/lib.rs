//! Field and epoch grouping for astronomical image stacking, plus survey
//! grid resolution for reference-tile selection.
//!
//! The crate covers two independent pipelines:
//!
//! - **Grouping**: per-image metadata is collected into an [`ImageCatalog`],
//!   partitioned by (telescope, instrument, filter), clustered into sky
//!   fields by a greedy nearest-reference threshold, split into observing
//!   epochs along the time axis, and written out as stacking manifests.
//! - **Grid resolution**: an image footprint is matched against a static
//!   zone/cell catalog of the survey's all-sky tiling to find the sub-tiles
//!   that overlap it, so the right reference tiles can be fetched for image
//!   subtraction.
//!
//! Network tile downloads, external resampling/co-addition tools, and FITS
//! pixel access are collaborator concerns behind narrow interfaces
//! ([`MetadataSource`], the manifest files, the sky-cell table); the core
//! here is pure, synchronous computation over in-memory tables.

pub mod catalog;
pub mod cluster;
pub mod coords;
pub mod epoch;
pub mod error;
pub mod grid;
pub mod group;
pub mod io;
pub mod manifest;

pub use catalog::{ImageCatalog, ImageId, ImageMetadata, ImageRecord, MetadataSource, PartitionKey};
pub use cluster::{FieldAssigner, FieldAssignment, GreedyFieldAssigner};
pub use coords::Equatorial;
pub use error::{ConfigurationError, GeometryError, MetadataError};
pub use grid::{Footprint, SkyCell, SkyGridResolver};
pub use group::{group_catalog, GroupingConfig};
pub use manifest::GroupManifestWriter;
