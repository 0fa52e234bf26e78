//! End-to-end trace store scenarios.
//!
//! Feeds synthetic glider flights (straight glides and thermal circles)
//! through the public API and checks the store's retention guarantees.
//!
//! Run with: `cargo test --test trace_scenarios`

use std::collections::BTreeSet;

use flight_trace::{AircraftFix, AppendOutcome, GpsPoint, Trace, TraceConfig};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Straight glide north, one fix every `interval` seconds.
fn glide(count: u32, interval: f64) -> Vec<AircraftFix> {
    (0..count)
        .map(|i| {
            AircraftFix::new(GpsPoint::new(46.5 + i as f64 * 0.0005, 7.5), i as f64 * interval)
        })
        .collect()
}

/// Glide interleaved with thermal circles, one fix per second.
fn cross_country(count: u32) -> Vec<AircraftFix> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let leg = (i / 120) as f64;
            let circling = (i / 60) % 2 == 1;
            let (dlat, dlon) = if circling {
                let angle = t * 0.25;
                (0.002 * angle.sin(), 0.003 * angle.cos())
            } else {
                (0.0, 0.0)
            };
            AircraftFix::new(
                GpsPoint::new(46.5 + leg * 0.05 + (t % 60.0) * 0.0004 + dlat, 7.5 + dlon),
                t,
            )
            .with_altitude(1500.0 + (t * 0.3).sin() * 200.0)
        })
        .collect()
}

fn retained_times(trace: &Trace) -> Vec<u32> {
    trace.iter().map(|p| p.time).collect()
}

#[test]
fn capacity_holds_after_every_optimise() {
    init_logging();
    let config = TraceConfig::default()
        .with_max_points(50)
        .with_no_thin_time(20);
    let mut trace = Trace::new(config).unwrap();

    for fix in cross_country(3000) {
        trace.append(&fix);
        trace.optimise();
        assert!(trace.size() <= 50, "size {} exceeds cap", trace.size());
    }

    assert!(trace.size() >= 2);
    assert!(trace.average_delta_time() > 2.0);
    assert!(trace.average_delta_distance() > 0.0);
}

#[test]
fn capacity_holds_with_time_window() {
    let config = TraceConfig::default()
        .with_max_points(64)
        .with_max_time(600)
        .with_no_thin_time(30);
    let mut trace = Trace::new(config).unwrap();

    for fix in cross_country(4000) {
        trace.append(&fix);
        trace.optimise();
        assert!(trace.size() <= 64);
        if let Some(first) = trace.iter().next() {
            let last = trace.last_point().unwrap();
            // Expired points may linger only until the next eviction pass
            assert!(first.time + 600 + 2 * 64 >= last.time);
        }
    }
}

#[test]
fn timestamps_stay_ordered() {
    let mut trace = Trace::new(TraceConfig::default().with_max_points(20).with_no_thin_time(4)).unwrap();

    for fix in cross_country(500) {
        trace.append(&fix);
        trace.optimise();
        let times = retained_times(&trace);
        assert!(times.windows(2).all(|w| w[0] <= w[1]), "out of order: {:?}", times);
    }
}

#[test]
fn throttled_fix_leaves_size_unchanged() {
    let mut trace = Trace::new(TraceConfig::default()).unwrap();
    let location = GpsPoint::new(46.5, 7.5);

    trace.append(&AircraftFix::new(location, 100.0));
    let before = trace.size();

    assert_eq!(trace.append(&AircraftFix::new(location, 101.5)), AppendOutcome::Throttled);
    assert_eq!(trace.size(), before);

    // A 1Hz feed keeps every other fix
    let mut trace = Trace::new(TraceConfig::default()).unwrap();
    for fix in glide(20, 1.0) {
        trace.append(&fix);
    }
    assert_eq!(trace.size(), 10);
}

#[test]
fn no_thin_window_never_simplified() {
    let no_thin_time = 20;
    let config = TraceConfig::default()
        .with_max_points(40)
        .with_no_thin_time(no_thin_time);
    let mut trace = Trace::new(config).unwrap();

    for fix in cross_country(2000) {
        trace.append(&fix);
        let before: BTreeSet<u32> = retained_times(&trace).into_iter().collect();
        trace.optimise();
        let after: BTreeSet<u32> = retained_times(&trace).into_iter().collect();

        let last = trace.last_point().unwrap().time;
        for removed in before.difference(&after) {
            assert!(
                i64::from(*removed) <= i64::from(last) - i64::from(no_thin_time),
                "point at {}s removed inside no-thin window (last {}s)",
                removed,
                last
            );
        }
    }
}

#[test]
fn optimise_is_idempotent() {
    let mut trace = Trace::new(TraceConfig::default().with_max_points(16).with_no_thin_time(6)).unwrap();

    for fix in cross_country(400) {
        trace.append(&fix);
        trace.optimise();
        assert!(!trace.optimise());
    }
}

#[test]
fn minimal_store_keeps_flight_edges() {
    let config = TraceConfig::default()
        .with_max_points(4)
        .with_unbounded_time()
        .with_no_thin_time(0);
    let mut trace = Trace::new(config).unwrap();

    let fixes = glide(11, 2.0);
    for fix in &fixes {
        assert_eq!(trace.append(fix), AppendOutcome::Appended);
        trace.optimise();
        assert!(trace.size() <= 4);
    }

    let edges = trace.trace_edges();
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].time, 0);
    assert_eq!(edges[0].location, fixes[0].location);
    assert_eq!(edges[1].time, 20);
    assert_eq!(edges[1].location, fixes[10].location);
}

#[test]
fn time_regression_resets_history() {
    init_logging();
    let mut trace = Trace::new(TraceConfig::default()).unwrap();
    let location = GpsPoint::new(46.5, 7.5);

    for t in [0.0, 10.0, 20.0] {
        assert_eq!(trace.append(&AircraftFix::new(location, t)), AppendOutcome::Appended);
    }
    assert_eq!(trace.size(), 3);

    assert_eq!(trace.append(&AircraftFix::new(location, 5.0)), AppendOutcome::Reset);
    assert_eq!(trace.size(), 0);
    assert!(trace.trace_edges().is_empty());
    assert_eq!(trace.average_delta_distance(), 0.0);

    // Restarted feed continues from its own clock
    assert_eq!(trace.append(&AircraftFix::new(location, 6.0)), AppendOutcome::Appended);
    assert_eq!(trace.append(&AircraftFix::new(location, 8.0)), AppendOutcome::Appended);
    assert_eq!(retained_times(&trace), vec![6, 8]);
}

#[test]
fn thinning_prefers_straight_segments() {
    // One sharp dogleg in an otherwise straight glide
    let mut fixes = glide(30, 2.0);
    fixes[15].location.longitude += 0.01;

    let config = TraceConfig::default()
        .with_max_points(8)
        .with_no_thin_time(0);
    let mut trace = Trace::new(config).unwrap();
    for fix in &fixes {
        trace.append(fix);
        trace.optimise();
    }

    assert!(retained_times(&trace).contains(&30));
}

#[test]
fn coarse_display_points() {
    let mut trace = Trace::new(TraceConfig::default()).unwrap();
    for fix in glide(50, 2.0) {
        trace.append(&fix);
    }

    // ~55m spacing, ask for 200m resolution over the last minute
    let points = trace.points_since(38, 200.0);
    assert!(!points.is_empty());
    assert!(points.iter().all(|p| p.time >= 38));
    assert_eq!(points.last().map(|p| p.time), Some(98));
    assert!(points.len() < 31);
}
