//! Per-point annotation record and its key/value extension codec.
//!
//! Each analysis pass owns a subset of the fields:
//! - `distance`: distance accumulator
//! - `slope`: slope pass
//! - `vertical_velocity_up` / `vertical_velocity_down`: vertical velocity pass
//! - `power_60s`: power curve pass
//! - `power` / `heart_rate`: decoded from the input file, never recomputed
//!
//! The codec turns the record into ordered `(key, text)` pairs and back. It
//! knows nothing about XML; the GPX adapter decides how pairs are embedded.

use serde::{Deserialize, Serialize};

/// Extension key for cumulative distance in meters.
pub const KEY_DISTANCE: &str = "distance";
/// Extension key for slope in percent.
pub const KEY_SLOPE: &str = "slope";
/// Extension key for ascent rate in m/s.
pub const KEY_VVELOCITY: &str = "vvelocity";
/// Extension key for descent rate in m/s.
pub const KEY_VVELOCITY_DOWN: &str = "vvelocity_down";
/// Extension key for the recorded power in watts.
pub const KEY_POWER: &str = "power";
/// Extension key for the 60-second centered power average.
pub const KEY_POWER_60S: &str = "power60s";
/// Extension key for heart rate in bpm.
pub const KEY_HEART_RATE: &str = "hr";

/// Computed and decoded values attached to one track point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    /// Cumulative distance from track start in meters
    pub distance: f64,
    /// Grade in percent
    pub slope: f64,
    /// Ascent rate in m/s
    pub vertical_velocity_up: f64,
    /// Descent rate in m/s, as a magnitude
    pub vertical_velocity_down: f64,
    /// Recorded power in watts
    pub power: Option<f64>,
    /// 60-second centered rolling power in watts
    pub power_60s: Option<u32>,
    /// Heart rate in bpm
    pub heart_rate: Option<u8>,
}

impl Annotations {
    /// Reset every computed field, keeping decoded sensor readings.
    pub fn reset_computed(&mut self) {
        *self = Self {
            power: self.power,
            heart_rate: self.heart_rate,
            ..Self::default()
        };
    }

    /// Encode into ordered key/value pairs.
    ///
    /// Computed fields are always present; sensor fields only when known.
    pub fn encode(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (KEY_DISTANCE, format_number(self.distance)),
            (KEY_SLOPE, format_number(self.slope)),
            (KEY_VVELOCITY, format_number(self.vertical_velocity_up)),
            (KEY_VVELOCITY_DOWN, format_number(self.vertical_velocity_down)),
        ];
        if let Some(power) = self.power {
            pairs.push((KEY_POWER, format_number(power)));
        }
        if let Some(power_60s) = self.power_60s {
            pairs.push((KEY_POWER_60S, power_60s.to_string()));
        }
        if let Some(hr) = self.heart_rate {
            pairs.push((KEY_HEART_RATE, hr.to_string()));
        }
        pairs
    }

    /// Decode from key/value pairs. Unknown keys and unparsable values are
    /// ignored.
    pub fn decode<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut out = Self::default();
        for (key, text) in pairs {
            let text = text.trim();
            match key {
                KEY_DISTANCE => set_f64(&mut out.distance, text),
                KEY_SLOPE => set_f64(&mut out.slope, text),
                KEY_VVELOCITY => set_f64(&mut out.vertical_velocity_up, text),
                KEY_VVELOCITY_DOWN => set_f64(&mut out.vertical_velocity_down, text),
                KEY_POWER | "watts" | "PowerInWatts" => {
                    out.power = text.parse::<f64>().ok().filter(|p| p.is_finite());
                }
                KEY_POWER_60S => out.power_60s = text.parse().ok(),
                KEY_HEART_RATE | "heartrate" => {
                    out.heart_rate = text
                        .parse::<f64>()
                        .ok()
                        .filter(|hr| (0.0..=255.0).contains(hr))
                        .map(|hr| hr.round() as u8);
                }
                _ => {}
            }
        }
        out
    }
}

fn set_f64(field: &mut f64, text: &str) {
    if let Ok(value) = text.parse::<f64>() {
        if value.is_finite() {
            *field = value;
        }
    }
}

/// Shortest text for a number: integers without a fraction, others with up
/// to six decimals.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let text = format!("{:.6}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
