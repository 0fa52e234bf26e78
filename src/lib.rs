//! # Flight Trace
//!
//! Bounded flight trace store for glide computers.
//!
//! This library provides:
//! - A flat-earth projection anchored at the first fix of a flight
//! - An online thinning engine that drops the least significant points first
//! - A trace store with ingestion throttling, time-window retention and a
//!   hard point budget suitable for embedded targets
//!
//! ## Quick Start
//!
//! ```rust
//! use flight_trace::{AircraftFix, GpsPoint, Trace, TraceConfig};
//!
//! let config = TraceConfig::default().with_max_points(100);
//! let mut trace = Trace::new(config).unwrap();
//!
//! for i in 0..500 {
//!     let fix = AircraftFix::new(GpsPoint::new(47.0 + i as f64 * 0.0001, 8.0), i as f64 * 2.0);
//!     trace.append(&fix);
//!     trace.optimise();
//! }
//!
//! assert!(trace.size() <= 100);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TraceError};

// Local planar projection
pub mod projection;
pub use projection::FlatProjection;

// Retained samples
pub mod trace_point;
pub use trace_point::TracePoint;

// Cost-ranked thinning engine
pub mod delta_list;
pub use delta_list::DeltaList;

// Public trace store
pub mod trace;
pub use trace::{AppendOutcome, Trace, TraceConfig, TraceStats, MIN_SAMPLE_INTERVAL};

// Batch helpers over trace snapshots
pub mod algorithms;

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 position in decimal degrees, as reported by the receiver.
///
/// The first valid position of a flight anchors the trace's
/// [`FlatProjection`]; later positions are measured in metres from it.
///
/// # Example
/// ```
/// use flight_trace::{FlatProjection, GpsPoint};
///
/// let launch = GpsPoint::new(46.68, 7.86); // Amisbühl, above Interlaken
/// let turnpoint = GpsPoint::new(46.69, 7.86);
/// assert!(launch.is_valid());
///
/// let projection = FlatProjection::new(launch);
/// let offset = projection.project(&turnpoint);
/// assert!(offset.x.abs() < 1.0);
/// assert!((offset.y - 1112.0).abs() < 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// One aircraft state sample as delivered by the GPS/device layer.
///
/// Only location and time matter to the trace; altitude is carried through
/// to retained points for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AircraftFix {
    pub location: GpsPoint,
    /// Monotonic time in seconds, `0..=u32::MAX`
    pub time: f64,
    /// Altitude in metres
    #[serde(default)]
    pub altitude: Option<f64>,
}

impl AircraftFix {
    pub fn new(location: GpsPoint, time: f64) -> Self {
        Self {
            location,
            time,
            altitude: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Check that the fix carries a usable location and a time that fits
    /// the trace's whole-second clock.
    pub fn is_valid(&self) -> bool {
        self.location.is_valid()
            && self.time.is_finite()
            && self.time >= 0.0
            && self.time <= f64::from(u32::MAX)
    }
}
