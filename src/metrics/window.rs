//! Sliding window engine shared by the slope and vertical velocity passes.
//!
//! A window buffers consecutive points, measured along a position axis
//! (distance or elapsed time). It is armed once its span first exceeds half
//! the target. After each push an armed window whose span reaches the target
//! and which holds more than two points emits one value, attributed to its
//! center point, and then shrinks by dropping both its oldest and its newest
//! point. Consecutive windows therefore overlap heavily.

use super::elevation::{ElevationFilter, ElevationSample};
use super::regression::linear_regression;
use crate::track::TrackPoint;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Slopes are only reported for fits better than this
pub const MIN_R_SQUARED: f64 = 0.9;

/// How a window turns its points into a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationMode {
    /// Regression slope, or smoothed gain and loss for vertical velocity
    #[default]
    Smoothed,
    /// Plain difference between the last and the first point
    Ratio,
}

/// A quantity computed over windows of points.
pub trait WindowMetric {
    type Output;

    /// Position of a point along the window axis. Points without one are
    /// not buffered.
    fn position(&self, point: &TrackPoint) -> Option<f64>;

    /// Span at which a window is complete.
    fn target_span(&self) -> f64;

    /// Value of a complete window.
    fn aggregate(&self, window: &Window<'_>) -> Self::Output;
}

/// Points currently inside a window.
#[derive(Debug)]
pub struct Window<'a> {
    points: &'a [TrackPoint],
    /// (point index, position) in buffer order
    entries: &'a [(usize, f64)],
}

impl<'a> Window<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distance between the first and last position.
    pub fn span(&self) -> f64 {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => last.1 - first.1,
            _ => 0.0,
        }
    }

    /// Buffered points with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &'a TrackPoint)> + '_ {
        self.entries.iter().map(|(i, pos)| (*pos, &self.points[*i]))
    }

    /// Elevation samples of the buffered points that have an elevation.
    pub fn elevation_samples(&self) -> Vec<ElevationSample> {
        self.entries
            .iter()
            .filter_map(|(i, _)| {
                self.points[*i]
                    .elevation
                    .map(|e| ElevationSample::new(*i, e))
            })
            .collect()
    }

    /// Index of the first buffered point at or past the middle of the span.
    pub fn center(&self) -> Option<usize> {
        let first = self.entries.first()?.1;
        let middle = first + self.span() / 2.0;
        self.entries
            .iter()
            .find(|(_, pos)| *pos >= middle)
            .map(|(i, _)| *i)
    }
}

/// One value emitted by a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowValue<T> {
    /// Index of the point the value is attributed to
    pub center: usize,
    /// Span of the window that produced the value
    pub span: f64,
    pub value: T,
}

/// Lazy iterator over the values of a metric along a point sequence.
pub struct WindowedValues<'a, M: WindowMetric> {
    points: &'a [TrackPoint],
    metric: &'a M,
    next: usize,
    buffer: VecDeque<(usize, f64)>,
    armed: bool,
}

impl<'a, M: WindowMetric> WindowedValues<'a, M> {
    pub fn new(points: &'a [TrackPoint], metric: &'a M) -> Self {
        Self {
            points,
            metric,
            next: 0,
            buffer: VecDeque::new(),
            armed: false,
        }
    }

    fn span(&self) -> f64 {
        match (self.buffer.front(), self.buffer.back()) {
            (Some(first), Some(last)) => last.1 - first.1,
            _ => 0.0,
        }
    }
}

impl<'a, M: WindowMetric> Iterator for WindowedValues<'a, M> {
    type Item = WindowValue<M::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        let target = self.metric.target_span();
        while self.next < self.points.len() {
            let index = self.next;
            self.next += 1;

            let Some(position) = self.metric.position(&self.points[index]) else {
                continue;
            };
            self.buffer.push_back((index, position));

            let span = self.span();
            if !self.armed && span > target / 2.0 {
                self.armed = true;
            }
            if !(self.armed && span >= target && self.buffer.len() > 2) {
                continue;
            }

            let entries = self.buffer.make_contiguous();
            let window = Window {
                points: self.points,
                entries,
            };
            let center = window.center().unwrap_or(index);
            let value = self.metric.aggregate(&window);

            self.buffer.pop_front();
            self.buffer.pop_back();

            return Some(WindowValue {
                center,
                span,
                value,
            });
        }
        None
    }
}

/// Iterate the values of `metric` along `points`.
pub fn windowed<'a, M: WindowMetric>(
    points: &'a [TrackPoint],
    metric: &'a M,
) -> WindowedValues<'a, M> {
    WindowedValues::new(points, metric)
}

/// Grade in percent over a distance window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeMetric {
    /// Window length in meters
    pub interval_m: f64,
    pub mode: AggregationMode,
}

impl SlopeMetric {
    pub fn new(interval_m: f64, mode: AggregationMode) -> Self {
        Self { interval_m, mode }
    }
}

impl WindowMetric for SlopeMetric {
    type Output = f64;

    fn position(&self, point: &TrackPoint) -> Option<f64> {
        let distance = point.annotations.distance;
        (point.elevation.is_some() && distance.is_finite() && distance >= 0.0).then_some(distance)
    }

    fn target_span(&self) -> f64 {
        self.interval_m
    }

    fn aggregate(&self, window: &Window<'_>) -> f64 {
        let pairs: Vec<(f64, f64)> = window
            .iter()
            .filter_map(|(pos, p)| p.elevation.map(|e| (pos, e)))
            .collect();
        match self.mode {
            AggregationMode::Smoothed => match linear_regression(&pairs) {
                Ok(fit) if fit.r_squared > MIN_R_SQUARED => fit.slope * 100.0,
                _ => 0.0,
            },
            AggregationMode::Ratio => {
                let span = window.span();
                match (pairs.first(), pairs.last()) {
                    (Some(first), Some(last)) if span > 0.0 => (last.1 - first.1) / span * 100.0,
                    _ => 0.0,
                }
            }
        }
    }
}

/// Ascent and descent rate of one window, both as magnitudes in m/s.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VerticalRate {
    pub up: f64,
    pub down: f64,
}

/// Vertical velocity over a time window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalVelocityMetric {
    /// Window length in seconds
    pub window_s: f64,
    pub filter: ElevationFilter,
    pub mode: AggregationMode,
    /// Time all positions are measured from
    pub origin: chrono::DateTime<chrono::Utc>,
}

impl VerticalVelocityMetric {
    /// Metric measuring time from the first timed point of `points`.
    pub fn for_points(
        points: &[TrackPoint],
        window_s: f64,
        filter: ElevationFilter,
        mode: AggregationMode,
    ) -> Option<Self> {
        let origin = points.iter().find_map(|p| p.time)?;
        Some(Self {
            window_s,
            filter,
            mode,
            origin,
        })
    }
}

impl WindowMetric for VerticalVelocityMetric {
    type Output = VerticalRate;

    fn position(&self, point: &TrackPoint) -> Option<f64> {
        point.elevation?;
        let time = point.time?;
        Some((time - self.origin).num_milliseconds() as f64 / 1000.0)
    }

    fn target_span(&self) -> f64 {
        self.window_s
    }

    fn aggregate(&self, window: &Window<'_>) -> VerticalRate {
        let span = window.span();
        if span <= 0.0 {
            return VerticalRate::default();
        }
        let samples = window.elevation_samples();
        match self.mode {
            AggregationMode::Smoothed => {
                let filtered = self.filter.apply(&samples);
                VerticalRate {
                    up: filtered.gain / span,
                    down: filtered.loss.abs() / span,
                }
            }
            AggregationMode::Ratio => match (samples.first(), samples.last()) {
                (Some(first), Some(last)) => {
                    let net = last.elevation - first.elevation;
                    if net > 0.0 {
                        VerticalRate {
                            up: net / span,
                            down: 0.0,
                        }
                    } else {
                        VerticalRate {
                            up: 0.0,
                            down: -net / span,
                        }
                    }
                }
                _ => VerticalRate::default(),
            },
        }
    }
}
