//! Gnomonic (tangent-plane) projection for survey cells.
//!
//! Reproduces the survey's FITS TAN convention: a reference pixel `crpix`
//! maps to the projection center `crval`, pixel offsets scale by a fixed
//! 0.25″ step with the x axis mirrored (RA grows toward lower pixel x),
//! and world coordinates follow by deprojecting off the tangent plane.
//! Pixel coordinates use the 1-based FITS origin convention throughout.

use nalgebra::{Matrix3, Vector3};

use crate::coords::Equatorial;

/// Survey pixel scale in degrees per pixel (0.25 arcsec).
pub const PIXEL_SCALE_DEG: f64 = 0.25 / 3600.0;

/// Tangent-plane coordinate system for one sub-tile of a projection cell.
pub struct CellProjection {
    crpix1: f64,
    crpix2: f64,
    /// Degrees per pixel; x negative (RA axis mirrored), y positive.
    cdelt1: f64,
    cdelt2: f64,
    /// Camera-to-celestial basis: columns are east, north, and the
    /// direction of the projection center.
    rotation: Matrix3<f64>,
}

impl CellProjection {
    /// Build the projection anchored at `center` with the given reference
    /// pixel.
    ///
    /// The basis construction is degenerate when the center sits on a
    /// celestial pole; the resulting non-finite coordinates are caught by
    /// the resolver's corner checks rather than masked here.
    pub fn new(center: Equatorial, crpix1: f64, crpix2: f64) -> Self {
        let z = center.to_cartesian();
        let north = Vector3::new(0.0, 0.0, 1.0);
        let east = north.cross(&z).normalize();
        let y = z.cross(&east).normalize();
        let x = y.cross(&z).normalize();

        Self {
            crpix1,
            crpix2,
            cdelt1: -PIXEL_SCALE_DEG,
            cdelt2: PIXEL_SCALE_DEG,
            rotation: Matrix3::from_columns(&[x, y, z]),
        }
    }

    /// World coordinate of a pixel position.
    pub fn unproject(&self, px: f64, py: f64) -> Equatorial {
        let xi = (self.cdelt1 * (px - self.crpix1)).to_radians();
        let eta = (self.cdelt2 * (py - self.crpix2)).to_radians();

        // Ray through the tangent plane at unit distance, rotated back to
        // celestial axes.
        let world = (self.rotation * Vector3::new(xi, eta, 1.0)).normalize();
        Equatorial::from_degrees(
            world.y.atan2(world.x).to_degrees(),
            world.z.asin().to_degrees(),
        )
    }

    /// Pixel position of a world coordinate, or `None` when the coordinate
    /// lies behind the tangent plane.
    pub fn project(&self, coord: &Equatorial) -> Option<(f64, f64)> {
        let camera = self.rotation.transpose() * coord.to_cartesian();
        if camera.z <= 0.0 {
            return None;
        }

        let xi = (camera.x / camera.z).to_degrees();
        let eta = (camera.y / camera.z).to_degrees();
        Some((self.crpix1 + xi / self.cdelt1, self.crpix2 + eta / self.cdelt2))
    }
}
