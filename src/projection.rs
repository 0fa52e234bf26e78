//! Flat-earth projection anchored at a single geographic origin.
//!
//! Thinning works on Euclidean distances, so every fix is converted into a
//! local planar system (metres east/north of the origin). The equirectangular
//! approximation is good to well under a percent over the tens to low
//! hundreds of kilometres a single flight covers.

use geo::Coord;

use crate::GpsPoint;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const METRES_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Local planar projection anchored at an origin.
///
/// # Example
/// ```
/// use flight_trace::{FlatProjection, GpsPoint};
///
/// let origin = GpsPoint::new(47.0, 8.0);
/// let projection = FlatProjection::new(origin);
/// let p = projection.project(&GpsPoint::new(47.01, 8.0));
/// assert!(p.x.abs() < 1e-9);
/// assert!((p.y - 1111.95).abs() < 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatProjection {
    origin: GpsPoint,
    /// Longitude compression at the origin latitude (cos lat0).
    scale: f64,
}

impl Default for FlatProjection {
    fn default() -> Self {
        Self::new(GpsPoint::new(0.0, 0.0))
    }
}

impl FlatProjection {
    /// Create a projection anchored at `origin`.
    pub fn new(origin: GpsPoint) -> Self {
        Self {
            origin,
            scale: origin.latitude.to_radians().cos(),
        }
    }

    /// Move the anchor. All previously projected coordinates become invalid.
    pub fn reset(&mut self, origin: GpsPoint) {
        *self = Self::new(origin);
    }

    pub fn origin(&self) -> GpsPoint {
        self.origin
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Project a geographic point to metres east (x) and north (y) of the origin.
    pub fn project(&self, point: &GpsPoint) -> Coord<f64> {
        let mut dlon = point.longitude - self.origin.longitude;
        // Take the short way round across the antimeridian
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }

        Coord {
            x: dlon * self.scale * METRES_PER_DEGREE,
            y: (point.latitude - self.origin.latitude) * METRES_PER_DEGREE,
        }
    }

    /// Inverse of [`project`](Self::project).
    pub fn unproject(&self, coord: Coord<f64>) -> GpsPoint {
        let latitude = self.origin.latitude + coord.y / METRES_PER_DEGREE;
        let longitude = if self.scale.abs() > f64::EPSILON {
            self.origin.longitude + coord.x / (self.scale * METRES_PER_DEGREE)
        } else {
            self.origin.longitude
        };
        GpsPoint::new(latitude, longitude)
    }
}
