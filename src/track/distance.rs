//! Great-circle distance and cumulative distance along a track.

use super::{Track, TrackPoint};

/// Mean Earth radius in meters
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Calculate horizontal distance between two GPS points (Haversine formula)
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` slightly above 1 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS * c
}

/// Horizontal distance between two points, 0 when either lacks a position.
pub fn distance_2d(a: &TrackPoint, b: &TrackPoint) -> f64 {
    if !a.has_position() || !b.has_position() {
        return 0.0;
    }
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Distance including the elevation delta when both points have one.
pub fn distance_3d(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let horizontal = distance_2d(a, b);
    match (a.elevation, b.elevation) {
        (Some(ea), Some(eb)) => (horizontal.powi(2) + (eb - ea).powi(2)).sqrt(),
        _ => horizontal,
    }
}

/// Assign the running great-circle distance to every point of the track.
///
/// The total runs across segments; the first point of a later segment gets
/// the running total without a delta to the previous segment's last point.
/// Returns the final distance in meters.
pub fn accumulate_distance(track: &mut Track) -> f64 {
    let mut total = 0.0;
    for range in track.segment_ranges() {
        let segment = &mut track.points[range];
        let mut previous: Option<(f64, f64)> = None;
        for point in segment.iter_mut() {
            if let Some((lat, lon)) = previous {
                if point.has_position() {
                    total += haversine_distance(lat, lon, point.latitude, point.longitude);
                }
            }
            point.annotations.distance = total;
            if point.has_position() {
                previous = Some((point.latitude, point.longitude));
            }
        }
    }
    total
}
