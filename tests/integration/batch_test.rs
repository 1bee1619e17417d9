//! Integration tests for batch analysis

use crate::common::{read_summary, recording, start_time, write_track};
use trackanalyzer::analyzer::analyze_batch;
use trackanalyzer::storage::load_config_from;

const CONFIG: &str = r#"
[velocity]
distances_km = [1]

[output]
decimals = 1
write_simplified = true
"#;

#[test]
fn test_batch_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, CONFIG).unwrap();
    let config = load_config_from(&config_path).unwrap();

    let first = write_track(
        dir.path(),
        "first.gpx",
        &recording("First", start_time(7), 150, 10, 11.0, |i| 400.0 + (i / 3) as f64),
    );
    let empty = dir.path().join("empty.gpx");
    std::fs::write(
        &empty,
        r#"<?xml version="1.0"?><gpx version="1.1" creator="t"></gpx>"#,
    )
    .unwrap();
    let second = write_track(
        dir.path(),
        "second.gpx",
        &recording("Second", start_time(12), 90, 10, 15.0, |i| 650.0 - i as f64 * 0.4),
    );
    let out = dir.path().join("analyzed");

    let report = analyze_batch(&[&first, &empty, &second], &config, &out);
    assert_eq!(report.processed, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, empty);
    assert!(report.failures[0].error.contains("No track points"));
    assert!(!report.run_id.is_nil());

    for name in ["first", "second"] {
        assert!(out.join(format!("{}.gpx", name)).exists());
        assert!(out.join(format!("{}_simplified.gpx", name)).exists());
        let summary = read_summary(&out.join(format!("{}.json", name)));
        assert!(summary.contains_key("avg_velocity_1km"));
        assert!(!summary.keys().any(|k| k.starts_with("avg_velocity_5")));
    }
    assert_eq!(report.written.len(), 2);
}
