//! Flat summary record of one analysis run.

use serde::Serialize;
use std::collections::BTreeMap;

pub const KEY_DURATION: &str = "duration";
pub const KEY_MIN_ELEVATION: &str = "min_elevation";
pub const KEY_MAX_ELEVATION: &str = "max_elevation";
pub const KEY_NUMBER_POINTS: &str = "number_points";
pub const KEY_ELEVATION_GAIN: &str = "elevation_gain";
pub const KEY_ELEVATION_LOSS: &str = "elevation_loss";
pub const KEY_MOVING_TIME: &str = "moving_time";
pub const KEY_MOVING_DISTANCE: &str = "moving_distance";
pub const KEY_MAX_SPEED: &str = "max_speed";
pub const KEY_HEART_RATE_AVG: &str = "heart_rate_avg";
pub const KEY_HEART_RATE_MAX: &str = "heart_rate_max";
pub const KEY_POWER_AVG: &str = "power_avg";

/// `slope_<interval>`
pub fn slope_key(interval_m: u32) -> String {
    format!("slope_{}", interval_m)
}

/// `vertical_velocity_<w>s_+` and `vertical_velocity_<w>s_-`
pub fn vertical_velocity_keys(window_s: u32) -> (String, String) {
    (
        format!("vertical_velocity_{}s_+", window_s),
        format!("vertical_velocity_{}s_-", window_s),
    )
}

/// `avg_velocity_<d>km`
pub fn velocity_key(distance_km: u32) -> String {
    format!("avg_velocity_{}km", distance_km)
}

/// `power_<label>`
pub fn power_key(label: &str) -> String {
    format!("power_{}", label)
}

/// Aggregate name to value, in sorted key order.
///
/// A key is only present when its value could be computed; absence means
/// undefined, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Summary {
    values: BTreeMap<String, f64>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Non-finite values are not stored.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        if value.is_finite() {
            self.values.insert(key.into(), value);
        }
    }

    /// Insert a value when there is one.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<f64>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Copy with every value rounded to `decimals` places.
    pub fn rounded(&self, decimals: u32) -> Summary {
        let factor = 10f64.powi(decimals.min(15) as i32);
        let values = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), (v * factor).round() / factor))
            .collect();
        Summary { values }
    }

    /// Pretty JSON with values rounded to `decimals` places.
    pub fn to_json(&self, decimals: u32) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.rounded(decimals))
    }
}
