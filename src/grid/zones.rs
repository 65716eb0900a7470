//! Static projection-zone catalog for the survey tiling grid.
//!
//! The grid is organized in declination zones; each zone carries a row of
//! tiling parameters (base projection cell, cells per RA circle, sub-tile
//! pixel geometry). The catalog is loaded once per process from a CSV
//! table mirroring the survey's published grid file and treated as
//! read-only configuration afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coords::Equatorial;
use crate::error::ConfigurationError;

/// Overlap between adjacent sub-tiles of a projection cell, in pixels.
pub const SUBTILE_OVERLAP_PIX: f64 = 480.0;

/// Grid position of the sub-tile whose reference pixel coincides with the
/// projection cell's own.
const CENTER_SUBTILE: f64 = 5.0;

/// One declination band of the survey grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionZone {
    /// Zone identifier, ascending with declination.
    pub zone: i32,
    /// Projection-cell id of the zone's cell at RA 0.
    pub projcell: u32,
    /// Number of projection cells around the full RA circle; cell spacing
    /// is 360° / `nband`.
    pub nband: u32,
    /// Sub-tile width in pixels.
    pub xcell: u32,
    /// Sub-tile height in pixels.
    pub ycell: u32,
    /// Declination of the zone's projection centers, degrees.
    pub dec: f64,
    /// Lower declination bound of the zone, degrees.
    pub dec_min: f64,
    /// Upper declination bound of the zone, degrees.
    pub dec_max: f64,
    /// Reference pixel of the central sub-tile, x axis.
    pub crpix1: f64,
    /// Reference pixel of the central sub-tile, y axis.
    pub crpix2: f64,
}

impl ProjectionZone {
    /// Index of the projection cell nearest to `ra`.
    pub fn nearest_cell(&self, ra: f64) -> u32 {
        (self.projcell as f64 + ra * self.nband as f64 / 360.0).round() as u32
    }

    /// The contiguous cell range spanning both RA extrema of a footprint.
    pub fn candidate_cells(&self, ra_lo: f64, ra_hi: f64) -> std::ops::RangeInclusive<u32> {
        let a = self.nearest_cell(ra_lo);
        let b = self.nearest_cell(ra_hi);
        a.min(b)..=a.max(b)
    }

    /// Projection center of a cell in this zone.
    pub fn cell_center(&self, cell: u32) -> Equatorial {
        let ra = (cell as f64 - self.projcell as f64) * 360.0 / self.nband as f64;
        Equatorial::from_degrees(ra, self.dec)
    }

    /// Reference pixel of the sub-tile at grid position (`sub_x`, `sub_y`)
    /// in the 10×10 layout. Adjacent sub-tiles step by the sub-tile size
    /// minus the fixed 480-pixel overlap.
    pub fn subtile_crpix(&self, sub_x: u8, sub_y: u8) -> (f64, f64) {
        let crpix1 = self.crpix1
            + (CENTER_SUBTILE - sub_x as f64) * (self.xcell as f64 - SUBTILE_OVERLAP_PIX);
        let crpix2 = self.crpix2
            + (CENTER_SUBTILE - sub_y as f64) * (self.ycell as f64 - SUBTILE_OVERLAP_PIX);
        (crpix1, crpix2)
    }
}

/// Read-only zone catalog.
#[derive(Debug, Clone)]
pub struct ZoneCatalog {
    zones: Vec<ProjectionZone>,
}

impl ZoneCatalog {
    /// Load the catalog from a CSV table with one [`ProjectionZone`] row
    /// per line.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let unreadable = |source| ConfigurationError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::Reader::from_path(path).map_err(unreadable)?;
        let mut zones = Vec::new();
        for row in reader.deserialize() {
            zones.push(row.map_err(unreadable)?);
        }
        Self::from_zones(zones)
    }

    /// Build a catalog from in-memory rows, validating them.
    pub fn from_zones(zones: Vec<ProjectionZone>) -> Result<Self, ConfigurationError> {
        if zones.is_empty() {
            return Err(ConfigurationError::EmptyCatalog);
        }
        for z in &zones {
            let invalid = |reason: &str| ConfigurationError::InvalidZone {
                zone: z.zone,
                reason: reason.to_string(),
            };
            if z.nband == 0 {
                return Err(invalid("band count must be positive"));
            }
            if z.dec_min >= z.dec_max {
                return Err(invalid("declination bounds are inverted or empty"));
            }
            if (z.xcell as f64) <= SUBTILE_OVERLAP_PIX || (z.ycell as f64) <= SUBTILE_OVERLAP_PIX {
                return Err(invalid("sub-tile size must exceed the 480 px overlap"));
            }
        }
        Ok(Self { zones })
    }

    /// All zones in catalog order.
    pub fn zones(&self) -> &[ProjectionZone] {
        &self.zones
    }

    /// Number of zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether the catalog is empty (never true for a constructed catalog).
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Zones whose declination interval intersects `[dec_lo, dec_hi]`.
    pub fn zones_overlapping(&self, dec_lo: f64, dec_hi: f64) -> Vec<&ProjectionZone> {
        self.zones
            .iter()
            .filter(|z| z.dec_min <= dec_hi && z.dec_max >= dec_lo)
            .collect()
    }
}
