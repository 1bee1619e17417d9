//! Activity provider over a local folder.
//!
//! The folder holds `activity_<id>.json` documents plus the optional
//! `activity_<id>.gpx` track and `activity_<id>_splits.json` split files.
//! This is the layout [`download_activities_by_date`](super::download_activities_by_date)
//! writes, so one download folder can serve as the provider for another.

use super::{ActivityProvider, ActivityRecord, ProviderError};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of an activity document.
pub fn activity_file_name(activity_id: u64) -> String {
    format!("activity_{}.json", activity_id)
}

/// File name of an activity track.
pub fn track_file_name(activity_id: u64) -> String {
    format!("activity_{}.gpx", activity_id)
}

/// File name of an activity's splits.
pub fn splits_file_name(activity_id: u64) -> String {
    format!("activity_{}_splits.json", activity_id)
}

/// Id of an activity document file name, `None` for every other file.
fn parse_activity_file_name(name: &str) -> Option<u64> {
    name.strip_prefix("activity_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// Provider reading activities from a folder.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, file_name: &str, activity_id: u64) -> Result<Vec<u8>, ProviderError> {
        let path = self.root.join(file_name);
        if !path.exists() {
            return Err(ProviderError::NotFound(activity_id));
        }
        Ok(std::fs::read(path)?)
    }
}

impl ActivityProvider for DirectoryProvider {
    fn activities(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ActivityRecord>, ProviderError> {
        if !self.root.is_dir() {
            return Err(ProviderError::Connection(format!(
                "{} is not a folder",
                self.root.display()
            )));
        }

        let mut records = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(parse_activity_file_name) else {
                continue;
            };
            let content = std::fs::read_to_string(entry.path())?;
            let raw = match serde_json::from_str(&content) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Skipping unreadable activity {}: {}", id, e);
                    continue;
                }
            };
            let record = ActivityRecord::from_json(raw)?;
            if record.started_between(start, end) {
                records.push(record);
            }
        }
        records.sort_by_key(|r| (r.start_time_local, r.id));
        debug!(
            "{} activities between {} and {} in {}",
            records.len(),
            start,
            end,
            self.root.display()
        );
        Ok(records)
    }

    fn track(&self, activity_id: u64) -> Result<Vec<u8>, ProviderError> {
        self.read(&track_file_name(activity_id), activity_id)
    }

    fn splits(&self, activity_id: u64) -> Result<String, ProviderError> {
        let bytes = self.read(&splits_file_name(activity_id), activity_id)?;
        String::from_utf8(bytes).map_err(|e| ProviderError::InvalidData(e.to_string()))
    }
}
