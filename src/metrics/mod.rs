//! Metrics module for the per-point and summary track calculations.

pub mod elevation;
pub mod moving;
pub mod power_curve;
pub mod regression;
pub mod window;

pub use elevation::{
    keep_direction_changes, reduce_plateaus, reduce_to_relevant_points, ElevationFilter,
    ElevationSample, FilteredElevation,
};
pub use moving::{moving_data, MovingData, MovingSettings};
pub use power_curve::{PowerCurveAnalyzer, PowerCurvePoint, PowerReport, PowerSettings};
pub use regression::{linear_regression, LinearFit, RegressionError};
pub use window::{
    windowed, AggregationMode, SlopeMetric, VerticalRate, VerticalVelocityMetric, Window,
    WindowMetric, WindowValue, WindowedValues,
};

use crate::track::TrackPoint;

/// Elevation samples of every point that has an elevation.
pub fn elevation_samples(points: &[TrackPoint]) -> Vec<ElevationSample> {
    points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.elevation.map(|e| ElevationSample::new(i, e)))
        .collect()
}

/// Run the full smoothing filter once over the whole track.
pub fn simplify_track_elevation(points: &[TrackPoint], filter: &ElevationFilter) -> FilteredElevation {
    filter.apply(&elevation_samples(points))
}
