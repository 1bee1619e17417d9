//! Power curve: best rolling average power for a menu of durations.
//!
//! Power readings are placed on a 1 Hz timeline. Short stops between two
//! readings are filled with zero power, long pauses are left open and the
//! tail is padded with zeros up to a fixed horizon. Rolling means are time
//! based: the window ending at `t` covers `(t - W, t]` and only counts when
//! it holds enough samples.

use crate::track::TrackPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Durations reported by the power curve, with their summary labels.
pub const STANDARD_DURATIONS: [(u32, &str); 12] = [
    (10, "10s"),
    (30, "30s"),
    (60, "1min"),
    (300, "5min"),
    (600, "10min"),
    (1200, "20min"),
    (1800, "30min"),
    (3600, "1h"),
    (7200, "2h"),
    (10800, "3h"),
    (14400, "4h"),
    (18000, "5h"),
];

/// Resampling and coverage settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerSettings {
    /// Gaps longer than this are filled with zero power
    pub fill_min_gap_s: u32,
    /// Gaps of at least this length are a pause and stay open
    pub pause_gap_s: u32,
    /// Timeline is padded with zeros to this many seconds
    pub horizon_s: u32,
    /// A duration is computed only for rides longer than this share of it
    pub coverage_ratio: f64,
    /// Width of the centered per-point average
    pub point_window_s: u32,
}

impl Default for PowerSettings {
    fn default() -> Self {
        Self {
            fill_min_gap_s: 5,
            pause_gap_s: 300,
            horizon_s: 18_500,
            coverage_ratio: 0.8,
            point_window_s: 60,
        }
    }
}

/// A single point on the power curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerCurvePoint {
    /// Duration in seconds.
    pub duration_secs: u32,
    /// Summary label, e.g. `5min`.
    pub label: String,
    /// Best average power at this duration (watts, rounded down).
    pub power_watts: u32,
}

/// Result of a power analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerReport {
    /// Best average over the whole ride duration
    pub power_avg: Option<u32>,
    /// Computed durations, shortest first
    pub curve: Vec<PowerCurvePoint>,
    /// Centered rolling average per input point, aligned with the input
    pub point_averages: Vec<Option<u32>>,
}

impl PowerReport {
    /// Get power at a specific duration, if it was computed.
    pub fn power_at(&self, duration_secs: u32) -> Option<u32> {
        self.curve
            .iter()
            .find(|p| p.duration_secs == duration_secs)
            .map(|p| p.power_watts)
    }
}

/// Power readings on a timeline of whole seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerTimeline {
    /// Seconds since the first reading, non-decreasing
    pub times: Vec<i64>,
    pub watts: Vec<f64>,
    /// Seconds between the first and last real reading
    pub duration: i64,
    /// Number of samples before tail padding
    pub recorded_len: usize,
}

impl PowerTimeline {
    /// Resample `(time, watts)` readings.
    ///
    /// Readings that go back in time are dropped, and so is the first
    /// reading after a pause. Gaps are measured between consecutive
    /// readings, so the ride resumes with the reading after that.
    pub fn resample(readings: &[(DateTime<Utc>, f64)], settings: &PowerSettings) -> Self {
        let mut timeline = Self::default();
        let Some(&(start, first_watts)) = readings.first() else {
            return timeline;
        };
        timeline.times.push(0);
        timeline.watts.push(first_watts);

        let mut previous = 0i64;
        let mut last_kept = 0i64;
        for &(time, watts) in &readings[1..] {
            let t = (time - start).num_seconds();
            let gap = t - previous;
            if gap < 0 {
                debug!("Dropping power reading {}s before its predecessor", -gap);
                continue;
            }
            previous = t;
            if gap >= settings.pause_gap_s as i64 {
                debug!("Dropping power reading after a {}s pause", gap);
                continue;
            }
            if gap > settings.fill_min_gap_s as i64 {
                for s in 1..gap {
                    timeline.times.push(t - gap + s);
                    timeline.watts.push(0.0);
                }
            }
            timeline.times.push(t);
            timeline.watts.push(watts);
            last_kept = t;
        }

        timeline.duration = last_kept;
        timeline.recorded_len = timeline.times.len();

        let to_add = settings.horizon_s as i64 - last_kept;
        for s in 1..to_add {
            timeline.times.push(last_kept + s);
            timeline.watts.push(0.0);
        }
        timeline
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    fn prefix_sums(&self) -> Vec<f64> {
        let mut prefix_sum = vec![0.0; self.watts.len() + 1];
        for (i, &w) in self.watts.iter().enumerate() {
            prefix_sum[i + 1] = prefix_sum[i] + w;
        }
        prefix_sum
    }

    /// Highest mean over windows `(t - width, t]` holding at least
    /// `min_count` samples, considering only windows ending at or after
    /// `from_time`.
    pub fn max_rolling_mean(&self, width: i64, min_count: usize, from_time: i64) -> Option<f64> {
        if width <= 0 {
            return None;
        }
        let prefix_sum = self.prefix_sums();
        let mut best: Option<f64> = None;
        let mut start = 0usize;
        for end in 0..self.times.len() {
            while self.times[end] - self.times[start] >= width {
                start += 1;
            }
            let count = end - start + 1;
            if count < min_count.max(1) || self.times[end] < from_time {
                continue;
            }
            let mean = (prefix_sum[end + 1] - prefix_sum[start]) / count as f64;
            best = Some(best.map_or(mean, |b: f64| b.max(mean)));
        }
        best
    }

    /// Mean over `[t - width/2, t + width/2)` for each of `times`.
    pub fn centered_means(&self, times: &[i64], width: i64) -> Vec<Option<f64>> {
        let prefix_sum = self.prefix_sums();
        let half = width / 2;
        times
            .iter()
            .map(|&t| {
                let lo = self.times.partition_point(|&x| x < t - half);
                let hi = self.times.partition_point(|&x| x < t + (width - half));
                (hi > lo).then(|| (prefix_sum[hi] - prefix_sum[lo]) / (hi - lo) as f64)
            })
            .collect()
    }
}

/// Calculator for the power curve of one ride.
pub struct PowerCurveAnalyzer {
    /// Durations to calculate, with labels
    durations: Vec<(u32, String)>,
    settings: PowerSettings,
}

impl Default for PowerCurveAnalyzer {
    fn default() -> Self {
        Self::standard(PowerSettings::default())
    }
}

impl PowerCurveAnalyzer {
    /// Create a new analyzer for specified durations.
    pub fn new(durations: &[(u32, &str)], settings: PowerSettings) -> Self {
        let mut sorted: Vec<(u32, String)> = durations
            .iter()
            .map(|(d, label)| (*d, label.to_string()))
            .collect();
        sorted.sort_by_key(|(d, _)| *d);
        Self {
            durations: sorted,
            settings,
        }
    }

    /// Create with standard durations (10s to 5h).
    pub fn standard(settings: PowerSettings) -> Self {
        Self::new(&STANDARD_DURATIONS, settings)
    }

    /// Analyze the points of a ride.
    ///
    /// Only points with both a time and a power reading take part. Returns
    /// `None` unless the readings contain at least two distinct values.
    pub fn analyze(&self, points: &[TrackPoint]) -> Option<PowerReport> {
        let readings: Vec<(usize, DateTime<Utc>, f64)> = points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| Some((i, p.time?, p.annotations.power?)))
            .collect();

        let timeline = PowerTimeline::resample(
            &readings.iter().map(|(_, t, w)| (*t, *w)).collect::<Vec<_>>(),
            &self.settings,
        );
        let recorded = &timeline.watts[..timeline.recorded_len];
        let first = recorded.first()?;
        if recorded.iter().all(|w| w == first) {
            debug!("Power analysis skipped, fewer than two distinct readings");
            return None;
        }

        let duration = timeline.duration;
        let mut report = PowerReport::default();

        if duration > 0 {
            report.power_avg = timeline
                .max_rolling_mean(duration, timeline.recorded_len.saturating_sub(1), 0)
                .map(|m| m.floor() as u32);
        }

        for (width, label) in &self.durations {
            if duration as f64 <= *width as f64 * self.settings.coverage_ratio {
                continue;
            }
            let width = *width as i64;
            let best = timeline
                .max_rolling_mean(width, width as usize, 0)
                .or_else(|| timeline.max_rolling_mean(width, 1, width));
            if let Some(best) = best {
                report.curve.push(PowerCurvePoint {
                    duration_secs: width as u32,
                    label: label.clone(),
                    power_watts: best.floor() as u32,
                });
            }
        }

        let mut point_averages = vec![None; points.len()];
        if let Some(&(_, start, _)) = readings.first() {
            let times: Vec<i64> = readings
                .iter()
                .map(|(_, t, _)| (*t - start).num_seconds())
                .collect();
            let means = timeline.centered_means(&times, self.settings.point_window_s as i64);
            for ((index, _, _), mean) in readings.iter().zip(means) {
                point_averages[*index] = mean.map(|m| m.floor() as u32);
            }
        }
        report.point_averages = point_averages;

        Some(report)
    }
}
