//! Distance to duration curve and best average velocity over a distance.
//!
//! The curve comes either from lap split files or from the track itself.
//! Several split files of one outing are stitched together: each later
//! series continues from the distance and duration where the previous one
//! ended.

pub mod splits;

pub use splits::SplitSeries;

use crate::track::TrackPoint;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while reading split files
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Cumulative distance (m) and duration (s) at one point of the curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityEntry {
    pub distance: f64,
    pub duration: f64,
}

impl VelocityEntry {
    pub fn new(distance: f64, duration: f64) -> Self {
        Self { distance, duration }
    }
}

/// Non-decreasing curve of cumulative distance against cumulative duration,
/// starting at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityCurve {
    entries: Vec<VelocityEntry>,
}

impl Default for VelocityCurve {
    fn default() -> Self {
        Self {
            entries: vec![VelocityEntry::new(0.0, 0.0)],
        }
    }
}

impl VelocityCurve {
    /// Stitch split series into one curve.
    ///
    /// Series are ordered by start time when every series has one, else
    /// kept in the given order. Entries that would step back in distance or
    /// duration are dropped.
    pub fn from_series(mut series: Vec<SplitSeries>) -> Self {
        if series.iter().all(|s| s.start_time.is_some()) {
            series.sort_by_key(|s| s.start_time);
        }
        let mut curve = Self::default();
        for s in &series {
            let offset = curve.end();
            for entry in &s.entries {
                curve.push(VelocityEntry::new(
                    offset.distance + entry.distance,
                    offset.duration + entry.duration,
                ));
            }
        }
        curve
    }

    /// Read split files and stitch them into one curve.
    pub fn from_split_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, SplitError> {
        let series = paths
            .iter()
            .map(|p| SplitSeries::from_path(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_series(series))
    }

    /// Build the curve from the distance annotation and elapsed time of the
    /// timed points of a track.
    pub fn from_points(points: &[TrackPoint]) -> Self {
        let mut curve = Self::default();
        let Some(first) = points.iter().find(|p| p.time.is_some()) else {
            return curve;
        };
        let base = first.annotations.distance;
        for point in points {
            if let Some(seconds) = point.seconds_since(first) {
                curve.push(VelocityEntry::new(point.annotations.distance - base, seconds));
            }
        }
        curve
    }

    fn push(&mut self, entry: VelocityEntry) {
        let end = self.end();
        if !entry.distance.is_finite()
            || !entry.duration.is_finite()
            || entry.distance < end.distance
            || entry.duration < end.duration
        {
            debug!("Dropping velocity entry stepping back: {:?}", entry);
            return;
        }
        if entry != end {
            self.entries.push(entry);
        }
    }

    fn end(&self) -> VelocityEntry {
        self.entries
            .last()
            .copied()
            .unwrap_or(VelocityEntry::new(0.0, 0.0))
    }

    pub fn entries(&self) -> &[VelocityEntry] {
        &self.entries
    }

    /// Total distance covered by the curve in meters.
    pub fn total_distance(&self) -> f64 {
        self.end().distance
    }

    /// Whether the curve covers any distance.
    pub fn is_empty(&self) -> bool {
        self.total_distance() <= 0.0
    }

    /// First time the curve reaches `distance`.
    fn earliest_time_at(&self, distance: f64) -> Option<f64> {
        let j = self.entries.partition_point(|e| e.distance < distance);
        let upper = self.entries.get(j)?;
        if j == 0 || upper.distance == distance {
            return Some(upper.duration);
        }
        let lower = self.entries[j - 1];
        Some(interpolate(lower, *upper, distance))
    }

    /// Last time the curve is still at `distance`.
    fn latest_time_at(&self, distance: f64) -> Option<f64> {
        let j = self.entries.partition_point(|e| e.distance <= distance);
        if j == 0 {
            return None;
        }
        let lower = self.entries[j - 1];
        match self.entries.get(j) {
            Some(upper) if lower.distance < distance => Some(interpolate(lower, *upper, distance)),
            _ => Some(lower.duration),
        }
    }

    /// Best average velocity in km/h over a stretch of exactly `distance_m`
    /// meters, or `None` when the curve is shorter than that.
    ///
    /// The duration of a stretch is linear between curve nodes, so it is
    /// enough to try stretches starting or ending at a node.
    pub fn average_velocity_for_distance(&self, distance_m: f64) -> Option<f64> {
        if distance_m <= 0.0 || self.total_distance() < distance_m {
            return None;
        }
        let mut best: Option<f64> = None;
        let mut consider = |start: Option<f64>, end: Option<f64>| {
            if let (Some(start), Some(end)) = (start, end) {
                let duration = end - start;
                if duration > 0.0 {
                    best = Some(best.map_or(duration, |b: f64| b.min(duration)));
                }
            }
        };
        for entry in &self.entries {
            if entry.distance + distance_m <= self.total_distance() {
                consider(
                    self.latest_time_at(entry.distance),
                    self.earliest_time_at(entry.distance + distance_m),
                );
            }
            if entry.distance >= distance_m {
                consider(
                    self.latest_time_at(entry.distance - distance_m),
                    self.earliest_time_at(entry.distance),
                );
            }
        }
        best.map(|duration| distance_m / duration * 3.6)
    }

    /// Best average velocity in km/h over `km` kilometers.
    pub fn average_velocity_for_kilometers(&self, km: f64) -> Option<f64> {
        self.average_velocity_for_distance(km * 1000.0)
    }
}

fn interpolate(lower: VelocityEntry, upper: VelocityEntry, distance: f64) -> f64 {
    let ratio = (distance - lower.distance) / (upper.distance - lower.distance);
    lower.duration + ratio * (upper.duration - lower.duration)
}
