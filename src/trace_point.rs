//! A single retained trace sample.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::projection::FlatProjection;
use crate::AircraftFix;
use crate::GpsPoint;

/// One point of the retained trace.
///
/// Immutable after creation: the store hands out copies or shared
/// references, never mutable access.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracePoint {
    /// Original geographic location
    pub location: GpsPoint,
    /// Position in metres relative to the trace's projection origin
    pub flat: Coord<f64>,
    /// Whole seconds of the feed's monotonic clock
    pub time: u32,
    /// Altitude in metres (if the fix carried one)
    pub altitude: Option<f64>,
}

impl TracePoint {
    /// Build a trace point from a fix, projecting it with `projection`.
    ///
    /// Fractional seconds are truncated. Times outside the clock range
    /// saturate; [`AircraftFix::is_valid`] rejects such fixes upstream.
    pub fn from_fix(fix: &AircraftFix, projection: &FlatProjection) -> Self {
        Self {
            location: fix.location,
            flat: projection.project(&fix.location),
            time: fix.time.max(0.0) as u32,
            altitude: fix.altitude,
        }
    }

    /// Planar distance to another point in metres.
    pub fn flat_distance(&self, other: &TracePoint) -> f64 {
        let d = self.flat - other.flat;
        d.x.hypot(d.y)
    }

    /// Seconds elapsed from `earlier` to this point (saturating).
    pub fn time_since(&self, earlier: &TracePoint) -> u32 {
        self.time.saturating_sub(earlier.time)
    }
}
