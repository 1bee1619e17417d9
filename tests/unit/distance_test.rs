//! Unit tests for distance accumulation

use trackanalyzer::track::{accumulate_distance, haversine_distance, Track, TrackLayout, TrackPoint};

fn zigzag(n: usize) -> Vec<TrackPoint> {
    (0..n)
        .map(|i| {
            let lon = if i % 2 == 0 { 11.0 } else { 11.0005 };
            TrackPoint::new(47.0 + i as f64 * 0.0003, lon)
        })
        .collect()
}

#[test]
fn test_haversine_is_symmetric() {
    let there = haversine_distance(47.2, 11.4, 47.3, 11.2);
    let back = haversine_distance(47.3, 11.2, 47.2, 11.4);
    assert!((there - back).abs() < 1e-6);
    assert_eq!(haversine_distance(47.2, 11.4, 47.2, 11.4), 0.0);
}

#[test]
fn test_distance_is_non_decreasing_per_segment() {
    let mut points = zigzag(40);
    points[17].latitude = f64::NAN;
    let mut track = Track {
        name: None,
        time: None,
        points,
        layout: vec![TrackLayout {
            name: None,
            segment_lens: vec![25, 15],
        }],
    };
    let total = accumulate_distance(&mut track);

    for range in track.segment_ranges() {
        let segment = &track.points[range];
        assert!(segment
            .windows(2)
            .all(|w| w[1].annotations.distance >= w[0].annotations.distance));
    }
    assert_eq!(track.points[0].annotations.distance, 0.0);
    assert!((track.final_distance() - total).abs() < 1e-9);
}

#[test]
fn test_segment_gap_adds_no_distance() {
    let mut points = zigzag(6);
    // Second segment starts far away
    for p in &mut points[3..] {
        p.latitude += 1.0;
    }
    let mut track = Track {
        name: None,
        time: None,
        points,
        layout: vec![TrackLayout {
            name: None,
            segment_lens: vec![3, 3],
        }],
    };
    let total = accumulate_distance(&mut track);
    let points = &track.points;
    assert_eq!(points[3].annotations.distance, points[2].annotations.distance);
    assert!(total < 1000.0, "got {}", total);
}
