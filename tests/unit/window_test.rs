//! Unit tests for the sliding window metrics

use chrono::{Duration, TimeZone, Utc};
use trackanalyzer::metrics::{
    windowed, AggregationMode, ElevationFilter, SlopeMetric, VerticalVelocityMetric,
};
use trackanalyzer::track::TrackPoint;

/// Points every `step_m` meters along the distance annotation.
fn along(elevations: &[f64], step_m: f64) -> Vec<TrackPoint> {
    elevations
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut p = TrackPoint::new(46.0, 8.0).with_elevation(*e);
            p.annotations.distance = i as f64 * step_m;
            p
        })
        .collect()
}

/// Points every `step_s` seconds.
fn timed(elevations: &[f64], step_s: i64) -> Vec<TrackPoint> {
    let t0 = Utc.with_ymd_and_hms(2024, 8, 15, 6, 30, 0).unwrap();
    elevations
        .iter()
        .enumerate()
        .map(|(i, e)| {
            TrackPoint::new(46.0, 8.0)
                .with_elevation(*e)
                .with_time(t0 + Duration::seconds(i as i64 * step_s))
        })
        .collect()
}

#[test]
fn test_two_points_never_emit() {
    let points = along(&[100.0, 150.0], 200.0);
    let metric = SlopeMetric::new(100.0, AggregationMode::Smoothed);
    assert_eq!(windowed(&points, &metric).count(), 0);
}

#[test]
fn test_short_track_never_emits() {
    let elevations: Vec<f64> = (0..9).map(|i| 100.0 + i as f64).collect();
    let points = along(&elevations, 10.0);
    let metric = SlopeMetric::new(100.0, AggregationMode::Smoothed);
    assert_eq!(windowed(&points, &metric).count(), 0);
}

#[test]
fn test_noise_gives_zero_slope() {
    let elevations: Vec<f64> = (0..60)
        .map(|i| if i % 2 == 0 { 400.0 } else { 410.0 })
        .collect();
    let points = along(&elevations, 10.0);
    let metric = SlopeMetric::new(100.0, AggregationMode::Smoothed);
    let values: Vec<f64> = windowed(&points, &metric).map(|v| v.value).collect();
    assert!(!values.is_empty());
    assert!(values.iter().all(|v| *v == 0.0), "{:?}", values);
}

#[test]
fn test_emitted_windows_are_complete() {
    let elevations: Vec<f64> = (0..80).map(|i| 50.0 + (i as f64 * 0.3).sin() * 4.0).collect();
    let points = along(&elevations, 7.5);
    let metric = SlopeMetric::new(100.0, AggregationMode::Ratio);
    for value in windowed(&points, &metric) {
        assert!(value.span >= 100.0);
        assert!(value.center > 0 && value.center < points.len() - 1);
    }
}

#[test]
fn test_steady_climb_vertical_velocity() {
    // 1 m every 10 s for 20 minutes
    let elevations: Vec<f64> = (0..121).map(|i| 800.0 + i as f64).collect();
    let points = timed(&elevations, 10);
    let metric = VerticalVelocityMetric::for_points(
        &points,
        600.0,
        ElevationFilter::default(),
        AggregationMode::Smoothed,
    )
    .unwrap();
    let values: Vec<_> = windowed(&points, &metric).collect();
    assert!(!values.is_empty());
    for v in &values {
        assert!((v.value.up - 0.1).abs() < 1e-9, "{:?}", v);
        assert_eq!(v.value.down, 0.0);
    }
}

#[test]
fn test_hour_window_needs_an_hour() {
    let elevations: Vec<f64> = (0..350).map(|i| 800.0 + i as f64).collect();
    let points = timed(&elevations, 10);
    let metric = VerticalVelocityMetric::for_points(
        &points,
        3600.0,
        ElevationFilter::default(),
        AggregationMode::Smoothed,
    )
    .unwrap();
    assert_eq!(windowed(&points, &metric).count(), 0);
}

#[test]
fn test_untimed_points_have_no_vertical_velocity() {
    let points = along(&[1.0, 2.0, 3.0], 10.0);
    assert!(VerticalVelocityMetric::for_points(
        &points,
        60.0,
        ElevationFilter::default(),
        AggregationMode::Smoothed
    )
    .is_none());
}
