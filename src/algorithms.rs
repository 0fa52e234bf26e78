//! # Algorithm Toolbox
//!
//! Batch helpers over trace snapshots, for consumers that render or analyse
//! a copy of the trace rather than the live store.
//!
//! - **Douglas-Peucker**: one-shot simplification of a snapshot for display
//!   at a given map scale (the live store thins online instead)
//! - **Path Length**: planar distance flown along retained points
//! - **Drop Cost**: the ranking metric used by the live store
//!
//! # Example
//!
//! ```rust
//! use flight_trace::algorithms::{douglas_peucker, path_length};
//! use flight_trace::{AircraftFix, GpsPoint, Trace, TraceConfig};
//!
//! let mut trace = Trace::new(TraceConfig::default()).unwrap();
//! for i in 0..20 {
//!     trace.append(&AircraftFix::new(GpsPoint::new(47.0 + i as f64 * 0.001, 8.0), i as f64 * 2.0));
//! }
//!
//! let points = trace.points();
//! let simplified = douglas_peucker(&points, 50.0);
//! assert_eq!(simplified.len(), 2);
//! assert!((path_length(&simplified) - path_length(&points)).abs() < 1.0);
//! ```

use geo::{algorithm::simplify::SimplifyIdx, Coord, LineString};

// =============================================================================
// Core Types (re-exported from lib)
// =============================================================================

pub use crate::{AircraftFix, FlatProjection, GpsPoint, TracePoint};

// =============================================================================
// Thinning Metric
// =============================================================================

/// Cost of dropping a point between two neighbours.
pub use crate::delta_list::drop_cost;

// =============================================================================
// Line Simplification
// =============================================================================

/// Douglas-Peucker line simplification over projected coordinates.
///
/// Uses the geo crate's implementation and keeps the original points
/// (time, location, altitude) of every survivor.
///
/// # Arguments
/// * `points` - Chronological trace points
/// * `tolerance` - Maximum deviation from the simplified line in metres
///
/// # Returns
/// Subset of `points`, first and last always included
pub fn douglas_peucker(points: &[TracePoint], tolerance: f64) -> Vec<TracePoint> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let coords: Vec<Coord<f64>> = points.iter().map(|p| p.flat).collect();
    let line = LineString::new(coords);

    line.simplify_idx(&tolerance)
        .into_iter()
        .filter_map(|idx| points.get(idx).copied())
        .collect()
}

/// Total planar length of a chronological point sequence in metres.
pub fn path_length(points: &[TracePoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].flat_distance(&pair[1]))
        .sum()
}
