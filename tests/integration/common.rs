//! Shared fixtures: synthetic recordings written as GPX files.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::{Path, PathBuf};
use trackanalyzer::track::writer::write_gpx_to_file;
use trackanalyzer::track::{Track, TrackPoint};

/// Meters per degree of latitude
pub const METERS_PER_DEGREE: f64 = 111_195.0;

pub fn start_time(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 9, 16, hour, 0, 0).unwrap()
}

/// Recording heading north: one point every `step_s` seconds and `step_m`
/// meters starting at `start`, elevation from `elevation(i)`.
pub fn recording(
    name: &str,
    start: DateTime<Utc>,
    n: usize,
    step_s: i64,
    step_m: f64,
    elevation: impl Fn(usize) -> f64,
) -> Track {
    let points = (0..n)
        .map(|i| {
            TrackPoint::new(47.0 + i as f64 * step_m / METERS_PER_DEGREE, 11.0)
                .with_elevation(elevation(i))
                .with_time(start + Duration::seconds(i as i64 * step_s))
        })
        .collect();
    Track::from_points(Some(name.to_string()), points)
}

/// Ride with power and heart rate readings on every point.
pub fn ride_with_sensors(start: DateTime<Utc>, n: usize, step_s: i64) -> Track {
    let mut track = recording("Ride", start, n, step_s, 40.0, |i| {
        600.0 + (i as f64 / 40.0).sin() * 80.0 + i as f64 * 0.2
    });
    for (i, point) in track.points.iter_mut().enumerate() {
        point.annotations.power = Some(150.0 + ((i * 37) % 120) as f64);
        point.annotations.heart_rate = Some(110 + (i % 40) as u8);
    }
    track
}

pub fn write_track(dir: &Path, file_name: &str, track: &Track) -> PathBuf {
    let path = dir.join(file_name);
    write_gpx_to_file(track, &path).unwrap();
    path
}

pub fn splits_json(laps: &[(f64, f64)]) -> String {
    let laps: Vec<serde_json::Value> = laps
        .iter()
        .map(|(d, t)| serde_json::json!({"distance": d, "duration": t}))
        .collect();
    serde_json::json!({ "lapDTOs": laps }).to_string()
}

pub fn read_summary(path: &Path) -> serde_json::Map<String, serde_json::Value> {
    let content = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}
