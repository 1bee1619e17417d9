//! Status-string entry points over an [`ActivityProvider`].

use super::directory::{activity_file_name, splits_file_name, track_file_name};
use super::{failure_status, success_status, ActivityProvider, ActivityRecord, ProviderError};
use crate::analyzer::TrackAnalyzer;
use crate::storage::AnalyzerConfig;
use chrono::NaiveDate;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Activities of one day as a JSON array, or a failure status.
pub fn activity_json_for_date<P: ActivityProvider>(provider: &P, date: NaiveDate) -> String {
    match provider.activities(date, date) {
        Ok(records) => {
            let docs: Vec<&Value> = records.iter().map(|r| &r.raw).collect();
            match serde_json::to_string(&docs) {
                Ok(json) => json,
                Err(e) => failure_status(&format!(
                    "Unknown error occurred during get activity json for date {}: {}",
                    date, e
                )),
            }
        }
        Err(e) => failure_status(&format!(
            "Error occurred during get activity json for date {}: {}",
            date, e
        )),
    }
}

/// Copy every activity between `start` and `end` into `folder`: the
/// activity document, its track and its splits.
///
/// Files that already exist are left alone. Returns
/// `return code: 0\nDownloaded <n> activities, wrote <m> to file` where `m`
/// counts the newly written activity documents, or a failure status.
pub fn download_activities_by_date<P: ActivityProvider>(
    provider: &P,
    folder: &Path,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    info!("Download activities between {} and {}", start, end);
    match download(provider, folder, start, end) {
        Ok((listed, written)) => success_status(Some(&format!(
            "Downloaded {} activities, wrote {} to file",
            listed, written
        ))),
        Err(e) => {
            warn!("Download failed: {}", e);
            failure_status(&format!(
                "Error occurred during download activities by date: {}",
                e
            ))
        }
    }
}

fn download<P: ActivityProvider>(
    provider: &P,
    folder: &Path,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(usize, usize), ProviderError> {
    let records = provider.activities(start, end)?;
    info!("Downloading {} activities", records.len());
    std::fs::create_dir_all(folder)?;

    let mut written = 0;
    for record in &records {
        if write_activity(folder, record)? {
            written += 1;
        }
        copy_optional(folder.join(track_file_name(record.id)), || {
            provider.track(record.id)
        })?;
        copy_optional(folder.join(splits_file_name(record.id)), || {
            provider.splits(record.id).map(String::into_bytes)
        })?;
    }
    Ok((records.len(), written))
}

fn write_activity(folder: &Path, record: &ActivityRecord) -> Result<bool, ProviderError> {
    let path = folder.join(activity_file_name(record.id));
    if path.exists() {
        return Ok(false);
    }
    let json = serde_json::to_string(&record.raw)
        .map_err(|e| ProviderError::InvalidData(e.to_string()))?;
    std::fs::write(&path, json)?;
    Ok(true)
}

/// Write provider data to `path` unless it exists. Data the provider does
/// not have is skipped.
fn copy_optional<F>(path: PathBuf, fetch: F) -> Result<(), ProviderError>
where
    F: FnOnce() -> Result<Vec<u8>, ProviderError>,
{
    if path.exists() {
        return Ok(());
    }
    match fetch() {
        Ok(bytes) => {
            std::fs::write(&path, bytes)?;
            Ok(())
        }
        Err(ProviderError::NotFound(id)) => {
            debug!("Activity {} has no {}", id, path.display());
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Analyze one GPX file and write the results to `output`.
///
/// Splits are read from `<stem>_splits.json` next to the track when it
/// exists. Returns `return code: 0` or a failure status.
pub fn analyze_gpx_track(path: &Path, output: &Path, config: &AnalyzerConfig) -> String {
    let mut split_files = Vec::new();
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        let splits = path.with_file_name(format!("{}_splits.json", stem));
        if splits.exists() {
            split_files.push(splits);
        }
    }

    let mut analyzer = TrackAnalyzer::new(path, config.clone()).with_split_files(split_files);
    let result = analyzer
        .analyze_with_fallback()
        .and_then(|_| analyzer.write(output));
    match result {
        Ok(_) => success_status(None),
        Err(e) => failure_status(&format!("Unknown error occurred {}", e)),
    }
}
