//! Integration tests for analyzing a track file end to end

use crate::common::{
    read_summary, recording, ride_with_sensors, splits_json, start_time, write_track,
};
use trackanalyzer::analyzer::{AnalyzerError, Stage, TrackAnalyzer};
use trackanalyzer::integrations::analyze_gpx_track;
use trackanalyzer::storage::AnalyzerConfig;
use trackanalyzer::track::Track;

#[test]
fn test_analyze_ride_file() {
    let dir = tempfile::tempdir().unwrap();
    // 40 minutes, a point every 5 s
    let input = write_track(dir.path(), "ride.gpx", &ride_with_sensors(start_time(8), 481, 5));
    let output = dir.path().join("out").join("ride.gpx");

    let mut analyzer = TrackAnalyzer::new(&input, AnalyzerConfig::default());
    analyzer.analyze_with_fallback().unwrap();
    let written = analyzer.write(&output).unwrap();
    assert_eq!(analyzer.stage(), Stage::Serialized);
    assert_eq!(written.summary, dir.path().join("out").join("ride.json"));
    assert_eq!(written.simplified, None);

    let annotated = Track::from_path(&output).unwrap();
    assert_eq!(annotated.len(), 481);
    assert!(annotated
        .points
        .windows(2)
        .all(|w| w[1].annotations.distance >= w[0].annotations.distance));
    assert!((annotated.final_distance() - 19_200.0).abs() < 20.0);
    assert!(annotated.points.iter().any(|p| p.annotations.power_60s.is_some()));
    assert_eq!(annotated.points[3].annotations.heart_rate, Some(113));

    let summary = read_summary(&written.summary);
    assert_eq!(summary["number_points"], 481.0);
    assert_eq!(summary["duration"], 2400.0);
    for key in [
        "slope_100",
        "vertical_velocity_60s_+",
        "vertical_velocity_600s_-",
        "power_avg",
        "power_20min",
        "avg_velocity_10km",
        "heart_rate_avg",
        "heart_rate_max",
        "moving_time",
        "elevation_gain",
    ] {
        assert!(summary.contains_key(key), "missing {}", key);
    }
    for key in [
        "vertical_velocity_3600s_+",
        "vertical_velocity_3600s_-",
        "power_1h",
        "avg_velocity_20km",
    ] {
        assert!(!summary.contains_key(key), "unexpected {}", key);
    }
    assert_eq!(summary["heart_rate_max"], 149.0);
}

#[test]
fn test_summary_keys_are_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_track(
        dir.path(),
        "walk.gpx",
        &recording("Walk", start_time(9), 200, 10, 12.0, |i| 300.0 + i as f64 * 0.5),
    );
    let mut analyzer = TrackAnalyzer::new(&input, AnalyzerConfig::default());
    analyzer.analyze(false).unwrap();
    let written = analyzer.write(&dir.path().join("walk_out.gpx")).unwrap();

    let content = std::fs::read_to_string(&written.summary).unwrap();
    let keys: Vec<&str> = content
        .lines()
        .filter_map(|line| line.trim().strip_prefix('"'))
        .filter_map(|rest| rest.split('"').next())
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert!(keys.contains(&"slope_100"));
}

#[test]
fn test_split_files_drive_velocity() {
    let dir = tempfile::tempdir().unwrap();
    // Track says 12 m every 10 s, about 4.3 km/h
    let input = write_track(
        dir.path(),
        "activity_7.gpx",
        &recording("Run", start_time(7), 200, 10, 12.0, |_| 500.0),
    );
    let splits = dir.path().join("activity_7_splits.json");
    std::fs::write(&splits, splits_json(&[(1000.0, 300.0), (1000.0, 240.0)])).unwrap();

    let mut from_track = TrackAnalyzer::new(&input, AnalyzerConfig::default());
    from_track.analyze(false).unwrap();
    let track_kmh = from_track.summary().get("avg_velocity_1km").unwrap();
    assert!((track_kmh - 4.32).abs() < 0.05, "got {}", track_kmh);

    let mut from_splits =
        TrackAnalyzer::new(&input, AnalyzerConfig::default()).with_split_files(vec![splits]);
    from_splits.analyze(false).unwrap();
    let split_kmh = from_splits.summary().get("avg_velocity_1km").unwrap();
    assert!((split_kmh - 15.0).abs() < 1e-9, "got {}", split_kmh);
    assert_eq!(from_splits.summary().get("avg_velocity_5km"), None);
}

#[test]
fn test_simplified_export() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_track(
        dir.path(),
        "hike.gpx",
        &recording("Hike", start_time(6), 300, 15, 10.0, |i| {
            1200.0 + ((i as f64) / 25.0).sin() * 60.0
        }),
    );
    let mut config = AnalyzerConfig::default();
    config.output.write_simplified = true;

    let mut analyzer = TrackAnalyzer::new(&input, config);
    analyzer.analyze(false).unwrap();
    let written = analyzer.write(&dir.path().join("hike_annotated.gpx")).unwrap();

    let simplified_path = written.simplified.unwrap();
    assert_eq!(
        simplified_path,
        dir.path().join("hike_annotated_simplified.gpx")
    );
    let simplified = Track::from_path(&simplified_path).unwrap();
    assert!(simplified.len() >= 2);
    assert!(simplified.len() < 300);
    assert_eq!(simplified.name.as_deref(), Some("Hike"));
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.gpx");
    std::fs::write(&input, "<gpx><trk><trkseg><trkpt lat=").unwrap();
    let mut analyzer = TrackAnalyzer::new(&input, AnalyzerConfig::default());
    assert!(matches!(
        analyzer.analyze(false),
        Err(AnalyzerError::Track(_))
    ));
    assert_eq!(analyzer.stage(), Stage::Init);
}

#[test]
fn test_status_string_entry_point() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_track(
        dir.path(),
        "activity_3.gpx",
        &recording("Loop", start_time(10), 120, 10, 15.0, |i| 200.0 + (i % 30) as f64),
    );
    let output = dir.path().join("activity_3_analyzed.gpx");
    let status = analyze_gpx_track(&input, &output, &AnalyzerConfig::default());
    assert_eq!(status, "return code: 0");
    assert!(output.exists());
    assert!(output.with_extension("json").exists());
}
