//! Difference list and outcome log fixtures.

use replicopy::config;
use replicopy::record::DiffRecord;
use std::path::Path;

/// Build a plain object record.
pub fn diff_record(key: &str) -> DiffRecord {
    serde_json::from_str(&format!(
        r#"{{"status":"","type":"file","lastModified":"2021-03-01T12:00:00Z","size":16,"key":"{}","etag":"etag-{}"}}"#,
        key,
        key.len()
    ))
    .unwrap()
}

/// Build a versioned object record.
#[allow(dead_code)] // Metadata fidelity tests only
pub fn versioned_record(key: &str, version: &str, etag: &str) -> DiffRecord {
    serde_json::from_str(&format!(
        r#"{{"key":"{}","versionId":"{}","etag":"{}","size":16,"versionOrdinal":1}}"#,
        key, version, etag
    ))
    .unwrap()
}

/// Build a delete-marker record.
pub fn marker_record(key: &str, version: &str) -> DiffRecord {
    serde_json::from_str(&format!(
        r#"{{"key":"{}","versionId":"{}","isDeleteMarker":true,"lastModified":"2021-03-01T12:00:00Z"}}"#,
        key, version
    ))
    .unwrap()
}

/// Write records as the working directory's difference list.
pub fn write_diff_list(dir: &Path, records: &[DiffRecord]) {
    let mut body = String::new();
    for record in records {
        body.push_str(&serde_json::to_string(record).unwrap());
        body.push('\n');
    }
    std::fs::write(dir.join(config::DIFF_LIST_FILE), body).unwrap();
}

/// Write raw lines as the difference list, valid or not.
pub fn write_raw_diff_list(dir: &Path, lines: &[&str]) {
    let mut body = lines.join("\n");
    body.push('\n');
    std::fs::write(dir.join(config::DIFF_LIST_FILE), body).unwrap();
}

/// Parse an outcome log back into records.
pub fn read_log(path: &Path) -> Vec<DiffRecord> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
