//! Integration tests for the activity provider entry points

use crate::common::{read_summary, recording, splits_json, start_time, write_track};
use chrono::NaiveDate;
use trackanalyzer::integrations::directory::{activity_file_name, splits_file_name};
use trackanalyzer::integrations::{
    activity_json_for_date, analyze_gpx_track, download_activities_by_date, DirectoryProvider,
    ReturnCode,
};
use trackanalyzer::storage::AnalyzerConfig;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 9, d).unwrap()
}

fn activity_folder(root: &std::path::Path) {
    for (id, start) in [(11u64, "2023-09-16 08:00:00"), (12, "2023-09-17 09:30:00")] {
        let doc = serde_json::json!({
            "activityId": id,
            "startTimeLocal": start,
            "activityType": {"typeId": 1}
        });
        std::fs::write(root.join(activity_file_name(id)), doc.to_string()).unwrap();
    }
    write_track(
        root,
        "activity_11.gpx",
        &recording("Morning run", start_time(8), 240, 5, 15.0, |i| 320.0 + (i % 50) as f64),
    );
    std::fs::write(
        root.join(splits_file_name(11)),
        splits_json(&[(1000.0, 330.0), (1000.0, 310.0), (1000.0, 320.0)]),
    )
    .unwrap();
}

#[test]
fn test_download_and_analyze() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    activity_folder(source.path());
    let provider = DirectoryProvider::new(source.path());

    let status = download_activities_by_date(&provider, target.path(), day(1), day(30));
    assert_eq!(
        status,
        "return code: 0\nDownloaded 2 activities, wrote 2 to file"
    );
    let again = download_activities_by_date(&provider, target.path(), day(1), day(30));
    assert_eq!(again, "return code: 0\nDownloaded 2 activities, wrote 0 to file");

    let track = target.path().join("activity_11.gpx");
    assert!(track.exists());
    assert!(target.path().join(splits_file_name(11)).exists());
    assert!(!target.path().join("activity_12.gpx").exists());

    let output = target.path().join("activity_11_analyzed.gpx");
    let status = analyze_gpx_track(&track, &output, &AnalyzerConfig::default());
    assert_eq!(ReturnCode::parse(&status), Some((ReturnCode::Success, "")));

    // Best kilometer comes from the splits: 1000 m in 310 s
    let summary = read_summary(&output.with_extension("json"));
    let kmh = summary["avg_velocity_1km"].as_f64().unwrap();
    assert!((kmh - 11.613).abs() < 1e-3, "got {}", kmh);
}

#[test]
fn test_activity_json_for_one_day() {
    let source = tempfile::tempdir().unwrap();
    activity_folder(source.path());
    let provider = DirectoryProvider::new(source.path());

    let json = activity_json_for_date(&provider, day(17));
    let docs: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["activityId"], 12);
}

#[test]
fn test_unreachable_provider() {
    let target = tempfile::tempdir().unwrap();
    let provider = DirectoryProvider::new(target.path().join("not-there"));
    let status = download_activities_by_date(&provider, target.path(), day(1), day(2));
    assert_eq!(
        ReturnCode::parse(&status).map(|(code, _)| code),
        Some(ReturnCode::Failure)
    );
}
