//! Lap split files.
//!
//! A split file is the JSON document a fitness service returns for the laps
//! of one activity. Only `lapDTOs[].distance`, `lapDTOs[].duration` and the
//! optional `lapDTOs[].startTimeGMT` are read; everything else is ignored.

use super::{SplitError, VelocityEntry};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SplitDocument {
    #[serde(rename = "lapDTOs", default)]
    laps: Vec<Lap>,
}

#[derive(Debug, Deserialize)]
struct Lap {
    #[serde(rename = "startTimeGMT")]
    start_time_gmt: Option<String>,
    distance: Option<f64>,
    duration: Option<f64>,
}

/// Cumulative entries read from one split file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitSeries {
    /// Start of the first lap, when known
    pub start_time: Option<DateTime<Utc>>,
    /// Cumulative (distance, duration) at the end of each valid lap
    pub entries: Vec<VelocityEntry>,
}

impl SplitSeries {
    /// Parse a split document.
    ///
    /// Laps without a finite, non-negative distance and duration are dropped.
    pub fn from_json(content: &str) -> Result<Self, SplitError> {
        let document: SplitDocument =
            serde_json::from_str(content).map_err(|e| SplitError::ParseError(e.to_string()))?;

        let start_time = document
            .laps
            .first()
            .and_then(|lap| lap.start_time_gmt.as_deref())
            .and_then(parse_gmt);

        let mut entries = Vec::with_capacity(document.laps.len());
        let mut distance = 0.0;
        let mut duration = 0.0;
        for (i, lap) in document.laps.iter().enumerate() {
            match (lap.distance, lap.duration) {
                (Some(d), Some(t)) if d.is_finite() && t.is_finite() && d >= 0.0 && t >= 0.0 => {
                    distance += d;
                    duration += t;
                    entries.push(VelocityEntry::new(distance, duration));
                }
                _ => warn!("Skipping invalid lap {}", i),
            }
        }
        debug!("Read {} laps, {:.0} m", entries.len(), distance);

        Ok(Self {
            start_time,
            entries,
        })
    }

    /// Read and parse a split file.
    pub fn from_path(path: &Path) -> Result<Self, SplitError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Distance at the end of the last lap.
    pub fn total_distance(&self) -> f64 {
        self.entries.last().map(|e| e.distance).unwrap_or(0.0)
    }
}

/// Parse a lap start time: RFC 3339, or a naive UTC timestamp such as
/// `2021-07-04T06:50:43.0`.
fn parse_gmt(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}
