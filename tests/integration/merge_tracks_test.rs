//! Integration tests for merging recordings

use crate::common::{recording, start_time, write_track};
use trackanalyzer::track::{merge_track_files, merge_tracks, Track, TrackError};

#[test]
fn test_merge_files_in_time_order() {
    let dir = tempfile::tempdir().unwrap();
    let afternoon = write_track(
        dir.path(),
        "afternoon.gpx",
        &recording("Afternoon", start_time(14), 50, 10, 20.0, |_| 900.0),
    );
    let morning = write_track(
        dir.path(),
        "morning.gpx",
        &recording("Morning", start_time(8), 100, 10, 10.0, |_| 700.0),
    );
    let output = dir.path().join("merged").join("day.gpx");

    let merged = merge_track_files(&[&afternoon, &morning], &output, "Saturday").unwrap();
    assert_eq!(merged.len(), 150);
    assert_eq!(merged.points[0].elevation, Some(700.0));
    assert_eq!(merged.time, Some(start_time(8)));

    let written = Track::from_path(&output).unwrap();
    assert_eq!(written.name.as_deref(), Some("Saturday"));
    assert_eq!(written.len(), 150);
    assert_eq!(written.layout.len(), 2);
    assert_eq!(written.layout[0].name.as_deref(), Some("Morning"));

    let distances: Vec<f64> = written.points.iter().map(|p| p.annotations.distance).collect();
    assert!(distances.windows(2).all(|w| w[1] >= w[0]));
    // 99 steps of 10 m, then 49 steps of 20 m without a reset in between
    assert!((distances[99] - 990.0).abs() < 0.1);
    assert!((distances[100] - distances[99]).abs() < 1e-6);
    assert!((distances[149] - 1970.0).abs() < 0.1);
}

#[test]
fn test_merge_nothing() {
    assert!(matches!(
        merge_tracks(Vec::new(), "Empty"),
        Err(TrackError::Empty)
    ));
}

#[test]
fn test_merge_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = merge_track_files(
        &[dir.path().join("absent.gpx")],
        &dir.path().join("out.gpx"),
        "x",
    );
    assert!(matches!(result, Err(TrackError::FileNotFound(_))));
}
