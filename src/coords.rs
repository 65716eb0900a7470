//! Equatorial sky coordinates and angular separation.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Sky position in the ICRS equatorial frame, in degrees.
///
/// Right ascension is normalized to `[0, 360)` at construction. Declination
/// is stored as given; catalog ingestion rejects non-finite values before
/// coordinates reach any geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equatorial {
    /// Right ascension in degrees, `[0, 360)`.
    pub ra: f64,
    /// Declination in degrees, `[-90, 90]`.
    pub dec: f64,
}

impl Equatorial {
    /// Create a coordinate from degrees, wrapping RA into `[0, 360)`.
    pub fn from_degrees(ra: f64, dec: f64) -> Self {
        Self {
            ra: ra.rem_euclid(360.0),
            dec,
        }
    }

    /// Whether both components are finite.
    pub fn is_finite(&self) -> bool {
        self.ra.is_finite() && self.dec.is_finite()
    }

    /// Unit vector on the celestial sphere (x toward RA=0 on the equator,
    /// z toward the north celestial pole).
    pub fn to_cartesian(&self) -> Vector3<f64> {
        let ra = self.ra.to_radians();
        let dec = self.dec.to_radians();
        Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin())
    }

    /// Great-circle separation to another coordinate, in degrees.
    ///
    /// Uses the haversine form, which is well conditioned at the small
    /// separations field clustering works with.
    pub fn separation_deg(&self, other: &Equatorial) -> f64 {
        let ra1 = self.ra.to_radians();
        let dec1 = self.dec.to_radians();
        let ra2 = other.ra.to_radians();
        let dec2 = other.dec.to_radians();

        let d_ra = ra2 - ra1;
        let d_dec = dec2 - dec1;

        let a = (d_dec / 2.0).sin().powi(2)
            + dec1.cos() * dec2.cos() * (d_ra / 2.0).sin().powi(2);
        // Guard rounding: a may exceed 1 by a few ulps for antipodal points.
        (2.0 * a.sqrt().min(1.0).asin()).to_degrees()
    }
}
