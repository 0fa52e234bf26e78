//! # Trace Store
//!
//! Public face of the library. Owns the projection and the [`DeltaList`],
//! throttles incoming fixes and keeps the trace within its point budget.
//!
//! ## Lifecycle
//!
//! - **Empty**: the next accepted fix anchors the projection.
//! - **Active**: `append` and `optimise` keep the store active. A fix older
//!   than the newest retained point resets it back to empty.
//!
//! The store is single-threaded and never locks. Callers feeding it from an
//! acquisition thread wrap it in their own `Mutex`.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::delta_list::{DeltaList, Iter};
use crate::error::{Result, TraceError};
use crate::projection::FlatProjection;
use crate::trace_point::TracePoint;
use crate::{AircraftFix, GpsPoint};

/// Minimum seconds between two retained points.
pub const MIN_SAMPLE_INTERVAL: u32 = 2;

/// Smallest usable point budget.
pub const MIN_MAX_POINTS: usize = 4;

// ============================================================================
// Configuration
// ============================================================================

/// Retention parameters for a [`Trace`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraceConfig {
    /// Most recent span (seconds) never thinned by cost.
    /// Default: 60
    pub no_thin_time: u32,

    /// Retention horizon in seconds. `None` keeps points regardless of age.
    /// Default: None
    pub max_time: Option<u32>,

    /// Hard cap on retained points. Must be at least 4.
    /// Default: 1000
    pub max_points: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            no_thin_time: 60,
            max_time: None,
            max_points: 1000,
        }
    }
}

impl TraceConfig {
    pub fn with_no_thin_time(mut self, seconds: u32) -> Self {
        self.no_thin_time = seconds;
        self
    }

    pub fn with_max_time(mut self, seconds: u32) -> Self {
        self.max_time = Some(seconds);
        self
    }

    pub fn with_unbounded_time(mut self) -> Self {
        self.max_time = None;
        self
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Point count that thinning reduces the trace to (75% of the cap).
    pub fn opt_points(&self) -> usize {
        (3 * self.max_points) / 4
    }

    /// Parse a JSON configuration and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TraceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the preconditions of the store.
    ///
    /// Besides the minimum cap, the no-thin window must not be able to hold
    /// more points than thinning is allowed to keep, otherwise the cap could
    /// not be honoured.
    pub fn validate(&self) -> Result<()> {
        if self.max_points < MIN_MAX_POINTS {
            return Err(TraceError::InvalidConfig {
                message: format!(
                    "max_points is {}, minimum {} required",
                    self.max_points, MIN_MAX_POINTS
                ),
            });
        }

        let protected = self.no_thin_time.div_ceil(MIN_SAMPLE_INTERVAL).max(1) as usize;
        // Protected points plus the oldest edge
        let unremovable = protected + 1;
        if unremovable > self.opt_points() {
            return Err(TraceError::InvalidConfig {
                message: format!(
                    "no_thin_time of {}s protects up to {} points, thinning target is {}",
                    self.no_thin_time,
                    unremovable,
                    self.opt_points()
                ),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Trace Store
// ============================================================================

/// What [`Trace::append`] did with a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Fix was retained as the newest point
    Appended,
    /// Fix arrived less than [`MIN_SAMPLE_INTERVAL`] after the newest point
    Throttled,
    /// Fix was older than the newest point; all history was discarded
    Reset,
    /// Fix had unusable coordinates or time
    Invalid,
}

/// Snapshot of trace statistics for monitoring and display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStats {
    pub size: usize,
    pub max_points: usize,
    pub start_time: Option<u32>,
    pub end_time: Option<u32>,
    /// Seconds covered by the retained points
    pub duration: u32,
    /// Metres
    pub average_delta_distance: f64,
    /// Seconds
    pub average_delta_time: f64,
    pub origin: Option<GpsPoint>,
}

/// Bounded flight trace.
///
/// # Example
/// ```
/// use flight_trace::{AircraftFix, AppendOutcome, GpsPoint, Trace, TraceConfig};
///
/// let mut trace = Trace::new(TraceConfig::default()).unwrap();
/// let here = GpsPoint::new(46.0, 7.0);
///
/// assert_eq!(trace.append(&AircraftFix::new(here, 0.0)), AppendOutcome::Appended);
/// assert_eq!(trace.append(&AircraftFix::new(here, 1.0)), AppendOutcome::Throttled);
/// assert_eq!(trace.append(&AircraftFix::new(here, 2.0)), AppendOutcome::Appended);
/// assert_eq!(trace.size(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Trace {
    config: TraceConfig,
    opt_points: usize,
    projection: FlatProjection,
    delta_list: DeltaList,
    average_delta_distance: f64,
    average_delta_time: f64,
}

impl Trace {
    /// Create an empty trace.
    ///
    /// Fails with [`TraceError::InvalidConfig`] if `max_points` is below
    /// [`MIN_MAX_POINTS`], or if the no-thin window can hold more points than
    /// thinning keeps: `max(1, ceil(no_thin_time / MIN_SAMPLE_INTERVAL)) + 1`
    /// must not exceed `3 * max_points / 4`.
    ///
    /// ```
    /// use flight_trace::{Trace, TraceConfig};
    ///
    /// let config = TraceConfig::default().with_max_points(4).with_no_thin_time(10);
    /// assert!(Trace::new(config).is_err());
    /// assert!(Trace::new(config.with_no_thin_time(2)).is_ok());
    /// ```
    pub fn new(config: TraceConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            opt_points: config.opt_points(),
            projection: FlatProjection::default(),
            delta_list: DeltaList::with_capacity(config.max_points + 1),
            average_delta_distance: 0.0,
            average_delta_time: 0.0,
        })
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Projection used for the retained points. Only meaningful once the
    /// trace holds at least one point.
    pub fn projection(&self) -> &FlatProjection {
        &self.projection
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Offer a new fix to the trace.
    ///
    /// Call [`optimise`](Self::optimise) afterwards to keep the trace within
    /// its budget.
    pub fn append(&mut self, fix: &AircraftFix) -> AppendOutcome {
        if !fix.is_valid() {
            debug!("[Trace] Ignoring invalid fix at {:.1}s", fix.time);
            return AppendOutcome::Invalid;
        }

        let last = match self.delta_list.back() {
            None => {
                // First point determines origin for flat projection
                self.projection.reset(fix.location);
                None
            }
            Some(last) if fix.time < f64::from(last.time) => {
                warn!(
                    "[Trace] Time went backwards ({:.1}s < {}s), discarding {} points",
                    fix.time,
                    last.time,
                    self.delta_list.len()
                );
                self.reset();
                return AppendOutcome::Reset;
            }
            Some(last) => Some(*last),
        };

        let point = TracePoint::from_fix(fix, &self.projection);

        if let Some(last) = last {
            if point.time_since(&last) < MIN_SAMPLE_INTERVAL {
                return AppendOutcome::Throttled;
            }
        }

        self.delta_list.append(point);
        AppendOutcome::Appended
    }

    /// Thin the trace if it has grown too large.
    ///
    /// Returns true if any point was removed, so consumers know to refresh
    /// anything derived from the trace.
    pub fn optimise(&mut self) -> bool {
        let size = self.size();

        if size >= self.config.max_points {
            // First remove points outside max time range
            let mut updated = self.delta_list.erase_earlier_than(self.min_time());

            if self.size() >= self.opt_points {
                // Still too big, fall back to line simplification
                updated |= self
                    .delta_list
                    .erase_delta(self.opt_points, self.config.no_thin_time);
            }

            if !updated {
                return false;
            }
        } else if size * 2 == self.config.max_points {
            // Half full: cheap moment to drop expired points
            if !self.delta_list.erase_earlier_than(self.min_time()) {
                return false;
            }
        } else {
            return false;
        }

        self.average_delta_distance = self
            .delta_list
            .average_delta_distance(self.config.no_thin_time);
        self.average_delta_time = self.delta_list.average_delta_time(self.config.no_thin_time);

        debug!(
            "[Trace] Optimised {} -> {} points (avg spacing {:.0}m / {:.1}s)",
            size,
            self.size(),
            self.average_delta_distance,
            self.average_delta_time
        );

        true
    }

    /// Discard all points.
    pub fn clear(&mut self) {
        info!("[Trace] Cleared {} points", self.size());
        self.reset();
    }

    fn reset(&mut self) {
        self.delta_list.clear();
        self.average_delta_distance = 0.0;
        self.average_delta_time = 0.0;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn size(&self) -> usize {
        self.delta_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delta_list.is_empty()
    }

    /// Newest retained point.
    pub fn last_point(&self) -> Option<&TracePoint> {
        self.delta_list.back()
    }

    /// Oldest time kept by the retention horizon, or 0 when unbounded.
    pub fn min_time(&self) -> u32 {
        match (self.delta_list.back(), self.config.max_time) {
            (Some(last), Some(max_time)) => last.time.saturating_sub(max_time),
            _ => 0,
        }
    }

    /// Oldest and newest points, or nothing if fewer than two are retained.
    pub fn trace_edges(&self) -> Vec<TracePoint> {
        match (self.delta_list.front(), self.delta_list.back()) {
            (Some(first), Some(last)) if self.size() >= 2 => vec![*first, *last],
            _ => Vec::new(),
        }
    }

    /// Mean distance between retained points outside the no-thin window,
    /// as of the last optimisation that changed the trace.
    pub fn average_delta_distance(&self) -> f64 {
        self.average_delta_distance
    }

    /// Mean time between retained points outside the no-thin window,
    /// as of the last optimisation that changed the trace.
    pub fn average_delta_time(&self) -> f64 {
        self.average_delta_time
    }

    /// Iterate retained points oldest first.
    pub fn iter(&self) -> Iter<'_> {
        self.delta_list.iter()
    }

    /// Copy of all retained points, oldest first.
    pub fn points(&self) -> Vec<TracePoint> {
        self.iter().copied().collect()
    }

    /// Points at or after `min_time`, dropping any point closer than
    /// `resolution` metres to the previously emitted one. The newest point
    /// is always included when it qualifies by time.
    pub fn points_since(&self, min_time: u32, resolution: f64) -> Vec<TracePoint> {
        let mut result: Vec<TracePoint> = Vec::new();

        for point in self.iter().filter(|p| p.time >= min_time) {
            if let Some(previous) = result.last() {
                if previous.flat_distance(point) < resolution {
                    continue;
                }
            }
            result.push(*point);
        }

        if let Some(newest) = self.last_point() {
            let emitted = result.last().map_or(false, |p| p.time == newest.time);
            if newest.time >= min_time && !emitted {
                result.push(*newest);
            }
        }

        result
    }

    pub fn stats(&self) -> TraceStats {
        let start_time = self.delta_list.front().map(|p| p.time);
        let end_time = self.delta_list.back().map(|p| p.time);

        TraceStats {
            size: self.size(),
            max_points: self.config.max_points,
            start_time,
            end_time,
            duration: match (start_time, end_time) {
                (Some(start), Some(end)) => end.saturating_sub(start),
                _ => 0,
            },
            average_delta_distance: self.average_delta_distance,
            average_delta_time: self.average_delta_time,
            origin: (!self.is_empty()).then(|| self.projection.origin()),
        }
    }

    /// Retained points as JSON for display consumers.
    pub fn points_json(&self) -> String {
        serde_json::to_string(&self.points()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Statistics snapshot as JSON.
    pub fn stats_json(&self) -> String {
        serde_json::to_string(&self.stats()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a TracePoint;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
