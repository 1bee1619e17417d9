//! Elevation smoothing filter.
//!
//! Reduces a run of elevation samples to the significant ones and sums up the
//! climbs and descents between them:
//! - [`reduce_plateaus`] drops samples whose rounded elevation repeats the
//!   previous sample
//! - [`keep_direction_changes`] keeps only peaks and valleys
//! - [`ElevationFilter::remove_small_differences`] merges deltas below the
//!   minimal delta and accumulates gain and loss
//!
//! The filter runs on every window of the vertical velocity pass and once over
//! the whole track for the summary totals and the simplified export.

use serde::{Deserialize, Serialize};

/// Minimal elevation change in meters counted as a climb or descent
pub const DEFAULT_MINIMAL_DELTA: f64 = 10.0;

/// One elevation reading and the index of the point it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSample {
    pub index: usize,
    pub elevation: f64,
}

impl ElevationSample {
    pub fn new(index: usize, elevation: f64) -> Self {
        Self { index, elevation }
    }

    fn rounded(&self) -> f64 {
        self.elevation.round_ties_even()
    }
}

/// Output of the minimal-delta merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredElevation {
    /// Samples that survived the filter, in input order
    pub samples: Vec<ElevationSample>,
    /// Sum of kept climbs in meters
    pub gain: f64,
    /// Sum of kept descents in meters, zero or negative
    pub loss: f64,
}

/// Keep the first and last sample, and every interior sample whose rounded
/// elevation differs from its immediate predecessor's.
pub fn reduce_plateaus(samples: &[ElevationSample]) -> Vec<ElevationSample> {
    let last = samples.len().saturating_sub(1);
    samples
        .iter()
        .enumerate()
        .filter(|(i, s)| *i == 0 || *i == last || s.rounded() != samples[i - 1].rounded())
        .map(|(_, s)| *s)
        .collect()
}

/// Keep the first and last sample, and every interior sample that differs
/// from both neighbors and reverses the direction of travel.
pub fn keep_direction_changes(samples: &[ElevationSample]) -> Vec<ElevationSample> {
    if samples.len() <= 2 {
        return samples.to_vec();
    }
    let mut kept = Vec::with_capacity(samples.len());
    kept.push(samples[0]);
    for w in samples.windows(3) {
        let (previous, current, next) = (w[0].rounded(), w[1].rounded(), w[2].rounded());
        if current != previous
            && current != next
            && (current - previous).signum() != (next - current).signum()
        {
            kept.push(w[1]);
        }
    }
    kept.push(samples[samples.len() - 1]);
    kept
}

/// Plateau reduction followed by the direction change reduction.
pub fn reduce_to_relevant_points(samples: &[ElevationSample]) -> Vec<ElevationSample> {
    keep_direction_changes(&reduce_plateaus(samples))
}

/// Minimal-delta merge configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationFilter {
    /// Deltas below this many meters are merged away
    pub minimal_delta: f64,
    /// Replace the last kept sample when the current one extends its move
    pub second_chance: bool,
}

impl Default for ElevationFilter {
    fn default() -> Self {
        Self {
            minimal_delta: DEFAULT_MINIMAL_DELTA,
            second_chance: true,
        }
    }
}

impl ElevationFilter {
    pub fn new(minimal_delta: f64) -> Self {
        Self {
            minimal_delta,
            ..Self::default()
        }
    }

    /// Walk the samples keeping those at least `minimal_delta` away from the
    /// last kept sample, summing signed deltas into gain and loss.
    ///
    /// With `second_chance`, a sample that is too close is still swapped in
    /// for the last kept one when it lies strictly further from the sample
    /// two back than the last kept one does. Its delta against the replaced
    /// sample is added to gain or loss.
    pub fn remove_small_differences(&self, samples: &[ElevationSample]) -> FilteredElevation {
        let mut out = FilteredElevation::default();
        let Some(first) = samples.first() else {
            return out;
        };
        out.samples.push(*first);

        for sample in &samples[1..] {
            let kept = &out.samples;
            let last = kept[kept.len() - 1].elevation;
            let delta = sample.elevation - last;

            let accept = if delta.abs() >= self.minimal_delta {
                true
            } else if self.second_chance && kept.len() > 1 {
                let second_last = kept[kept.len() - 2].elevation;
                if (sample.elevation - second_last).abs() > (last - second_last).abs() {
                    out.samples.pop();
                    true
                } else {
                    false
                }
            } else {
                false
            };

            if accept {
                out.samples.push(*sample);
                if delta > 0.0 {
                    out.gain += delta;
                } else {
                    out.loss += delta;
                }
            }
        }
        out
    }

    /// Full smoothing pass: plateaus, direction changes, minimal delta.
    pub fn apply(&self, samples: &[ElevationSample]) -> FilteredElevation {
        self.remove_small_differences(&reduce_to_relevant_points(samples))
    }
}
