//! Moving time, moving distance and maximum speed.

use crate::track::distance::distance_3d;
use crate::track::Track;
use serde::{Deserialize, Serialize};

/// Fewer moving pairs than this give no maximum speed
const MIN_SPEED_SAMPLES: usize = 20;
/// Pairs further than this many standard deviations from the mean pair
/// distance are left out of the maximum speed
const DISTANCE_DEVIATION_FACTOR: f64 = 1.5;

/// Moving data settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingSettings {
    /// Pairs at or below this speed count as stopped
    pub stopped_speed_kmh: f64,
    /// Share of the fastest speeds ignored for the maximum
    pub extreme_percentile: f64,
}

impl Default for MovingSettings {
    fn default() -> Self {
        Self {
            stopped_speed_kmh: 1.0,
            extreme_percentile: 0.05,
        }
    }
}

/// Totals split into moving and stopped parts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovingData {
    /// Seconds spent moving
    pub moving_time: f64,
    /// Seconds spent stopped
    pub stopped_time: f64,
    /// Meters covered while moving
    pub moving_distance: f64,
    /// Meters covered while stopped
    pub stopped_distance: f64,
    /// Robust maximum speed in m/s
    pub max_speed: Option<f64>,
}

/// Compute moving data over consecutive timed point pairs of each segment.
pub fn moving_data(track: &Track, settings: &MovingSettings) -> MovingData {
    let mut data = MovingData::default();
    // (speed m/s, distance m) of every moving pair
    let mut speeds_and_distances: Vec<(f64, f64)> = Vec::new();

    for range in track.segment_ranges() {
        let segment = &track.points[range];
        for pair in segment.windows(2) {
            let Some(seconds) = pair[1].seconds_since(&pair[0]) else {
                continue;
            };
            let distance = distance_3d(&pair[0], &pair[1]);
            let speed_kmh = if seconds > 0.0 {
                distance / seconds * 3.6
            } else {
                0.0
            };
            if speed_kmh <= settings.stopped_speed_kmh {
                data.stopped_time += seconds.max(0.0);
                data.stopped_distance += distance;
            } else {
                data.moving_time += seconds;
                data.moving_distance += distance;
                speeds_and_distances.push((distance / seconds, distance));
            }
        }
    }

    data.max_speed = robust_max_speed(&speeds_and_distances, settings.extreme_percentile);
    data
}

/// Maximum speed ignoring pairs with unusual distances and the top
/// `extreme_percentile` of speeds.
fn robust_max_speed(speeds_and_distances: &[(f64, f64)], extreme_percentile: f64) -> Option<f64> {
    if speeds_and_distances.len() < MIN_SPEED_SAMPLES {
        return None;
    }
    let n = speeds_and_distances.len() as f64;
    let mean = speeds_and_distances.iter().map(|(_, d)| d).sum::<f64>() / n;
    let deviation = (speeds_and_distances
        .iter()
        .map(|(_, d)| (d - mean).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    let mut speeds: Vec<f64> = speeds_and_distances
        .iter()
        .filter(|(_, d)| (d - mean).abs() <= deviation * DISTANCE_DEVIATION_FACTOR)
        .map(|(s, _)| *s)
        .collect();
    if speeds.is_empty() {
        return None;
    }
    speeds.sort_by(|a, b| a.total_cmp(b));

    let index = (speeds.len() as f64 * (1.0 - extreme_percentile)) as usize;
    speeds.get(index).or(speeds.last()).copied()
}
