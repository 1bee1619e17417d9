//! Unit tests for elevation smoothing

use trackanalyzer::metrics::{
    reduce_plateaus, reduce_to_relevant_points, ElevationFilter, ElevationSample,
};

fn samples(elevations: &[f64]) -> Vec<ElevationSample> {
    elevations
        .iter()
        .enumerate()
        .map(|(i, e)| ElevationSample::new(i, *e))
        .collect()
}

fn indices(samples: &[ElevationSample]) -> Vec<usize> {
    samples.iter().map(|s| s.index).collect()
}

#[test]
fn test_plateaus_use_half_even_rounding() {
    // 100.5 and 100.4 both round to 100
    let reduced = reduce_plateaus(&samples(&[99.0, 100.5, 100.4, 101.5, 101.0]));
    assert_eq!(indices(&reduced), vec![0, 1, 3, 4]);
}

#[test]
fn test_relevant_points_keep_peaks_and_valleys() {
    let reduced = reduce_to_relevant_points(&samples(&[
        500.0, 510.0, 510.0, 530.0, 520.0, 505.0, 505.0, 540.0,
    ]));
    assert_eq!(indices(&reduced), vec![0, 3, 5, 7]);
}

#[test]
fn test_merged_output_is_stable() {
    let filter = ElevationFilter::default();
    let once = filter.apply(&samples(&[
        1000.0, 1004.0, 1030.0, 1026.0, 1031.0, 990.0, 1002.0, 1060.0, 1055.0,
    ]));
    let twice = filter.remove_small_differences(&once.samples);
    assert_eq!(twice.samples, once.samples);
    assert_eq!(twice.gain, once.gain);
    assert_eq!(twice.loss, once.loss);
}

#[test]
fn test_second_chance_extends_last_kept_point() {
    let input = samples(&[0.0, 12.0, 20.0]);
    let with = ElevationFilter::default().remove_small_differences(&input);
    assert_eq!(indices(&with.samples), vec![0, 2]);
    assert_eq!(with.gain, 20.0);

    let without = ElevationFilter {
        second_chance: false,
        ..Default::default()
    }
    .remove_small_differences(&input);
    assert_eq!(indices(&without.samples), vec![0, 1]);
    assert_eq!(without.gain, 12.0);
}

#[test]
fn test_second_chance_needs_strictly_further_point() {
    // 12 is exactly as far from 0 as the kept 12: no replacement
    let filtered = ElevationFilter::default().remove_small_differences(&samples(&[0.0, 12.0, 12.0]));
    assert_eq!(indices(&filtered.samples), vec![0, 1]);
}

#[test]
fn test_loss_is_negative() {
    let filtered = ElevationFilter::new(5.0).apply(&samples(&[300.0, 250.0, 260.0, 200.0]));
    assert_eq!(filtered.gain, 10.0);
    assert_eq!(filtered.loss, -110.0);
}
