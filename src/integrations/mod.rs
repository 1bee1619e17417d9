//! Activity provider integration.
//!
//! An activity provider lists recorded activities and hands out their raw
//! track and split data. Calls across this boundary never raise: the
//! entry points in [`download`] turn every provider failure into a status
//! string starting with `return code: 1`.

pub mod directory;
pub mod download;

pub use directory::DirectoryProvider;
pub use download::{activity_json_for_date, analyze_gpx_track, download_activities_by_date};

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;

/// Prefix of every status string
pub const STATUS_PREFIX: &str = "return code: ";

/// Provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Activity not found: {0}")]
    NotFound(u64),

    #[error("Invalid activity data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One activity as listed by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    /// Provider activity id
    pub id: u64,
    /// Local start time, when the provider reports one
    pub start_time_local: Option<NaiveDateTime>,
    /// Full activity document as returned by the provider
    pub raw: Value,
}

impl ActivityRecord {
    /// Read the id and start time out of an activity document.
    pub fn from_json(raw: Value) -> Result<Self, ProviderError> {
        let id = raw
            .get("activityId")
            .and_then(Value::as_u64)
            .ok_or_else(|| ProviderError::InvalidData("missing activityId".to_string()))?;
        let start_time_local = raw
            .get("startTimeLocal")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok());
        Ok(Self {
            id,
            start_time_local,
            raw,
        })
    }

    /// Whether the activity started within `start..=end`. Activities without
    /// a start time never match.
    pub fn started_between(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_time_local
            .map(|t| (start..=end).contains(&t.date()))
            .unwrap_or(false)
    }
}

/// Source of recorded activities.
pub trait ActivityProvider {
    /// Activities that started between `start` and `end`, inclusive.
    fn activities(&self, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<ActivityRecord>, ProviderError>;

    /// Raw GPX of one activity.
    fn track(&self, activity_id: u64) -> Result<Vec<u8>, ProviderError>;

    /// Raw split JSON of one activity.
    fn splits(&self, activity_id: u64) -> Result<String, ProviderError>;
}

/// Outcome marker at the start of a status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    Success = 0,
    Failure = 1,
}

impl ReturnCode {
    /// Read the return code and the text after it.
    pub fn parse(status: &str) -> Option<(ReturnCode, &str)> {
        let rest = status.strip_prefix(STATUS_PREFIX)?;
        if let Some(detail) = rest.strip_prefix('0') {
            Some((ReturnCode::Success, detail.trim_start_matches('\n')))
        } else {
            rest.strip_prefix('1').map(|m| (ReturnCode::Failure, m))
        }
    }
}

/// `return code: 0`, with an optional detail line.
pub fn success_status(detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{}0\n{}", STATUS_PREFIX, detail),
        None => format!("{}0", STATUS_PREFIX),
    }
}

/// `return code: 1<message>`
pub fn failure_status(message: &str) -> String {
    format!("{}1{}", STATUS_PREFIX, message)
}
