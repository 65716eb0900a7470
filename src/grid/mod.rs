//! Survey grid resolution: map an image footprint onto the sub-tiles of
//! the fixed all-sky tiling that it overlaps.
//!
//! Bounding extents and intersection tests work in the flat RA/Dec plane
//! (see [`polygon`]); this matches the tile selections of the legacy
//! pipeline and is only valid away from the celestial poles and the
//! RA 0°/360° seam. Whether to move to true spherical-polygon
//! intersection is an open compatibility question, so the approximation
//! is kept as-is rather than silently corrected.

pub mod polygon;
pub mod projection;
pub mod zones;

use log::warn;
use rayon::prelude::*;

use crate::coords::Equatorial;
use crate::error::{ConfigurationError, GeometryError};
use self::polygon::Polygon;
use self::projection::CellProjection;
use self::zones::{ProjectionZone, ZoneCatalog};

/// Sub-tiles per projection-cell axis (10 × 10 layout).
pub const SUBTILES_PER_AXIS: u8 = 10;

/// Footprints with less flat-sky area than this are treated as degenerate.
const DEGENERATE_AREA_DEG2: f64 = 1e-12;

/// An image footprint given by its four corner coordinates.
///
/// Corner order does not matter for extent computation; the intersection
/// polygon uses the corners as given.
#[derive(Debug, Clone, Copy)]
pub struct Footprint {
    corners: [Equatorial; 4],
}

impl Footprint {
    /// Build a footprint, rejecting non-finite corners.
    pub fn new(corners: [Equatorial; 4]) -> Result<Self, GeometryError> {
        if corners.iter().any(|c| !c.is_finite()) {
            return Err(GeometryError::NonFiniteFootprint);
        }
        Ok(Self { corners })
    }

    /// The four corners as given.
    pub fn corners(&self) -> &[Equatorial; 4] {
        &self.corners
    }

    fn ra_extent(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for c in &self.corners {
            lo = lo.min(c.ra);
            hi = hi.max(c.ra);
        }
        (lo, hi)
    }

    fn dec_extent(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for c in &self.corners {
            lo = lo.min(c.dec);
            hi = hi.max(c.dec);
        }
        (lo, hi)
    }

    fn polygon(&self) -> Polygon {
        Polygon::new(self.corners.iter().map(|c| (c.ra, c.dec)).collect())
    }
}

/// One survey sub-tile that intersects a queried footprint.
///
/// Created fresh per resolver call; persistence belongs to the tile-fetch
/// collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyCell {
    /// Projection-cell index in the survey tiling.
    pub projection_cell: u32,
    /// Sub-tile row within the cell (0–9).
    pub sub_y: u8,
    /// Sub-tile column within the cell (0–9).
    pub sub_x: u8,
    /// Lowest corner RA of the sub-tile, degrees.
    pub ra_min: f64,
    /// Highest corner RA of the sub-tile, degrees.
    pub ra_max: f64,
    /// Lowest corner declination of the sub-tile, degrees.
    pub dec_min: f64,
    /// Highest corner declination of the sub-tile, degrees.
    pub dec_max: f64,
}

impl SkyCell {
    /// Projection-cell identifier in the survey convention, zero-padded to
    /// four digits.
    pub fn cell_id(&self) -> String {
        format!("{:04}", self.projection_cell)
    }

    /// Sub-tile identifier in the survey's `0yx` convention.
    pub fn sub_id(&self) -> String {
        format!("0{}{}", self.sub_y, self.sub_x)
    }

    /// Stable key for the tile-fetch collaborator's cache, unique per
    /// (projection cell, sub-tile, band).
    pub fn cache_key(&self, band: &str) -> String {
        format!("skycell.{}.{}.{band}", self.cell_id(), self.sub_id())
    }
}

/// Resolves image footprints against the survey grid.
pub struct SkyGridResolver {
    catalog: ZoneCatalog,
}

impl SkyGridResolver {
    /// Build a resolver over an already-loaded zone catalog.
    pub fn new(catalog: ZoneCatalog) -> Self {
        Self { catalog }
    }

    /// Load the zone catalog from a CSV file and build a resolver.
    pub fn from_csv_path(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigurationError> {
        Ok(Self::new(ZoneCatalog::from_csv_path(path)?))
    }

    /// The zone catalog backing this resolver.
    pub fn catalog(&self) -> &ZoneCatalog {
        &self.catalog
    }

    /// Find every sub-tile intersecting the footprint.
    ///
    /// Returns an empty set when the footprint overlaps no zone, and warns
    /// and returns an empty set for a degenerate (zero-area) footprint.
    /// The result is sorted by (cell, row, column) so repeated runs are
    /// byte-identical regardless of evaluation order.
    pub fn resolve(&self, footprint: &Footprint) -> Result<Vec<SkyCell>, GeometryError> {
        let image_poly = footprint.polygon();
        if image_poly.area() < DEGENERATE_AREA_DEG2 {
            warn!("degenerate footprint {:?}: no tile overlap computed", footprint.corners());
            return Ok(Vec::new());
        }

        let (ra_lo, ra_hi) = footprint.ra_extent();
        let (dec_lo, dec_hi) = footprint.dec_extent();

        // Candidate cells per zone; each evaluates independently.
        let mut jobs: Vec<(&ProjectionZone, u32)> = Vec::new();
        for zone in self.catalog.zones_overlapping(dec_lo, dec_hi) {
            for cell in zone.candidate_cells(ra_lo, ra_hi) {
                jobs.push((zone, cell));
            }
        }

        let per_cell: Vec<Vec<SkyCell>> = jobs
            .par_iter()
            .map(|(zone, cell)| subtiles_overlapping(zone, *cell, &image_poly))
            .collect::<Result<_, _>>()?;

        let mut cells: Vec<SkyCell> = per_cell.into_iter().flatten().collect();
        cells.sort_by_key(|c| (c.projection_cell, c.sub_y, c.sub_x));
        Ok(cells)
    }
}

/// Test all 100 sub-tiles of one projection cell against the footprint.
fn subtiles_overlapping(
    zone: &ProjectionZone,
    cell: u32,
    image_poly: &Polygon,
) -> Result<Vec<SkyCell>, GeometryError> {
    let center = zone.cell_center(cell);
    let width = zone.xcell as f64;
    let height = zone.ycell as f64;

    let mut out = Vec::new();
    for sub_y in 0..SUBTILES_PER_AXIS {
        for sub_x in 0..SUBTILES_PER_AXIS {
            let (crpix1, crpix2) = zone.subtile_crpix(sub_x, sub_y);
            let proj = CellProjection::new(center, crpix1, crpix2);

            let pixel_corners = [(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)];
            let mut world = [Equatorial { ra: 0.0, dec: 0.0 }; 4];
            for (slot, (px, py)) in world.iter_mut().zip(pixel_corners) {
                let corner = proj.unproject(px, py);
                if !corner.is_finite() {
                    return Err(GeometryError::NonFiniteCorner { cell, sub_y, sub_x });
                }
                *slot = corner;
            }

            let cell_poly = Polygon::new(world.iter().map(|c| (c.ra, c.dec)).collect());
            if image_poly.intersects(&cell_poly) {
                out.push(SkyCell {
                    projection_cell: cell,
                    sub_y,
                    sub_x,
                    ra_min: world.iter().fold(f64::INFINITY, |m, c| m.min(c.ra)),
                    ra_max: world.iter().fold(f64::NEG_INFINITY, |m, c| m.max(c.ra)),
                    dec_min: world.iter().fold(f64::INFINITY, |m, c| m.min(c.dec)),
                    dec_max: world.iter().fold(f64::NEG_INFINITY, |m, c| m.max(c.dec)),
                });
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprint_rejects_non_finite_corners() {
        let corners = [
            Equatorial::from_degrees(10.0, 0.0),
            Equatorial::from_degrees(10.1, 0.0),
            Equatorial {
                ra: f64::NAN,
                dec: 0.0,
            },
            Equatorial::from_degrees(10.0, 0.1),
        ];
        assert!(matches!(
            Footprint::new(corners),
            Err(GeometryError::NonFiniteFootprint)
        ));
    }

    #[test]
    fn sky_cell_identifiers_follow_the_survey_convention() {
        let cell = SkyCell {
            projection_cell: 635,
            sub_y: 4,
            sub_x: 7,
            ra_min: 0.0,
            ra_max: 0.0,
            dec_min: 0.0,
            dec_max: 0.0,
        };
        assert_eq!(cell.cell_id(), "0635");
        assert_eq!(cell.sub_id(), "047");
        assert_eq!(cell.cache_key("r"), "skycell.0635.047.r");

        let high = SkyCell {
            projection_cell: 2643,
            ..cell
        };
        assert_eq!(high.cell_id(), "2643");
    }
}
