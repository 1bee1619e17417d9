//! Unit tests for the power curve

use chrono::{DateTime, Duration, TimeZone, Utc};
use trackanalyzer::metrics::power_curve::{PowerTimeline, STANDARD_DURATIONS};
use trackanalyzer::metrics::{PowerCurveAnalyzer, PowerSettings};
use trackanalyzer::track::TrackPoint;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 7, 0, 0).unwrap()
}

fn ride(seconds: i64, watts: impl Fn(i64) -> f64) -> Vec<TrackPoint> {
    (0..seconds)
        .map(|s| {
            let mut p = TrackPoint::new(46.5, 9.8).with_time(start() + Duration::seconds(s));
            p.annotations.power = Some(watts(s));
            p
        })
        .collect()
}

#[test]
fn test_gaps_are_filled_only_between_bounds() {
    let settings = PowerSettings {
        horizon_s: 0,
        ..Default::default()
    };
    for (gap, fillers) in [(3, 0), (5, 0), (6, 5), (120, 119), (299, 298)] {
        let readings = [(start(), 150.0), (start() + Duration::seconds(gap), 250.0)];
        let timeline = PowerTimeline::resample(&readings, &settings);
        assert_eq!(timeline.len(), 2 + fillers, "gap {}", gap);
        assert_eq!(timeline.watts.last(), Some(&250.0));
    }
    // A pause drops the reading that ends it
    for gap in [300, 301] {
        let readings = [(start(), 150.0), (start() + Duration::seconds(gap), 250.0)];
        let timeline = PowerTimeline::resample(&readings, &settings);
        assert_eq!(timeline.watts, vec![150.0], "gap {}", gap);
    }
}

#[test]
fn test_short_ride_gets_short_durations_only() {
    let points = ride(30, |s| 100.0 + s as f64 * 10.0);
    let report = PowerCurveAnalyzer::default().analyze(&points).unwrap();
    let labels: Vec<&str> = report.curve.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["10s", "30s"]);
    assert_eq!(report.power_at(10), Some(345));
    assert_eq!(report.power_at(30), Some(245));
    assert_eq!(report.power_at(60), None);
    assert_eq!(report.power_avg, Some(250));
}

#[test]
fn test_point_averages_cover_every_point() {
    let mut points = ride(200, |s| 180.0 + (s % 20) as f64);
    points.push(TrackPoint::new(46.5, 9.8));
    let report = PowerCurveAnalyzer::default().analyze(&points).unwrap();
    assert_eq!(report.point_averages.len(), 201);
    assert_eq!(report.point_averages[200], None);
    assert!(report.point_averages[100].is_some());
}

#[test]
fn test_standard_durations_are_ascending() {
    assert!(STANDARD_DURATIONS.windows(2).all(|w| w[0].0 < w[1].0));
    assert_eq!(STANDARD_DURATIONS[0], (10, "10s"));
    assert_eq!(STANDARD_DURATIONS[11], (18000, "5h"));
}

#[test]
fn test_no_power_no_report() {
    let points: Vec<TrackPoint> = (0..100)
        .map(|s| TrackPoint::new(46.5, 9.8).with_time(start() + Duration::seconds(s)))
        .collect();
    assert!(PowerCurveAnalyzer::default().analyze(&points).is_none());
}
