//! Error taxonomy for catalog ingestion, grid configuration, and geometry.
//!
//! Propagation policy: metadata errors are fatal for the affected record
//! only and never abort a whole partition; configuration errors abort the
//! run; geometry errors abort resolution for the image being queried. A
//! degenerate (zero-area) footprint is not an error at all: the resolver
//! logs a warning and returns an empty result.

use std::path::PathBuf;
use thiserror::Error;

/// An image record lacks usable metadata.
///
/// A record hitting one of these is skipped, never defaulted: a missing
/// timestamp or coordinate must not propagate as zero/NaN into clustering.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// No usable observation time was found for the image.
    #[error("{filename}: no usable observation time (expected DATE-OBS or JD)")]
    MissingTimestamp {
        /// Image the timestamp was read for.
        filename: String,
    },

    /// No usable sky coordinate was found for the image.
    #[error("{filename}: no usable sky coordinate (expected CRVAL1/CRVAL2)")]
    MissingCoordinate {
        /// Image the coordinate was read for.
        filename: String,
    },

    /// A metadata value parsed but is NaN or infinite.
    #[error("{filename}: non-finite {quantity}")]
    NonFinite {
        /// Image the value was read for.
        filename: String,
        /// Which quantity was non-finite.
        quantity: &'static str,
    },

    /// The metadata table itself could not be read or parsed.
    #[error("failed to read metadata table {path}: {source}")]
    Table {
        /// Path of the table.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Filesystem error while discovering images.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// FITS header access failure.
    #[cfg(feature = "fits")]
    #[error("FITS header read failed: {0}")]
    Fits(#[from] fitsio::errors::Error),
}

/// The static grid catalog is missing or unusable. Fatal for the run.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// The zone catalog file could not be read or parsed.
    #[error("zone catalog {path}: {source}")]
    Unreadable {
        /// Path of the catalog file.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// The zone catalog parsed but holds no rows.
    #[error("zone catalog contains no zones")]
    EmptyCatalog,

    /// A zone row fails a structural sanity check.
    #[error("zone {zone}: {reason}")]
    InvalidZone {
        /// Zone identifier of the offending row.
        zone: i32,
        /// What was wrong with it.
        reason: String,
    },
}

/// Projection produced coordinates that cannot be used. Fatal for the
/// image being resolved.
#[derive(Error, Debug)]
pub enum GeometryError {
    /// A footprint corner has a NaN or infinite coordinate.
    #[error("footprint corner has a non-finite coordinate")]
    NonFiniteFootprint,

    /// A sub-tile corner unprojected to a non-finite world coordinate.
    #[error("sub-tile corner projected to a non-finite coordinate (cell {cell}, sub-tile 0{sub_y}{sub_x})")]
    NonFiniteCorner {
        /// Projection cell being evaluated.
        cell: u32,
        /// Sub-tile row (0–9, ascending declination).
        sub_y: u8,
        /// Sub-tile column (0–9).
        sub_x: u8,
    },
}
