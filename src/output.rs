//! Snapshot output and the append-only refresh log.
//!
//! Snapshots go to stdout or a file as JSON; one summary row per refresh can
//! additionally be appended to a CSV log.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info};

use crate::dashboard::Snapshot;

/// One row of the refresh log: enough to see at a glance whether a refresh
/// produced data and where its peaks were.
#[derive(Debug, Default, Serialize)]
pub struct RefreshSummary {
    pub timestamp: DateTime<Utc>,
    pub speed_rows: usize,
    pub crowd_rows: usize,
    pub matched_rows: usize,
    pub max_speed: Option<f64>,
    pub max_count: Option<f64>,
    pub speed_error: Option<String>,
    pub crowd_error: Option<String>,
}

impl RefreshSummary {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let speed = snapshot.speed.as_ok();
        let crowd = snapshot.crowd.as_ok();

        RefreshSummary {
            timestamp: snapshot.generated_at,
            speed_rows: speed.map_or(0, |c| c.points.len()),
            crowd_rows: crowd.map_or(0, |c| c.points.len()),
            matched_rows: snapshot
                .correlation
                .as_ok()
                .map_or(0, |c| c.matched.len()),
            max_speed: speed.and_then(|c| c.max).map(|m| m.value),
            max_count: crowd.and_then(|c| c.max).map(|m| m.value),
            speed_error: snapshot.speed.error_message().map(String::from),
            crowd_error: snapshot.crowd.error_message().map(String::from),
        }
    }
}

/// Writes a snapshot as pretty JSON to `path`, or to stdout when `path` is
/// `None`.
pub fn write_snapshot(path: Option<&str>, snapshot: &Snapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    match path {
        Some(path) => {
            std::fs::write(path, json)?;
            info!(path, "snapshot written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Appends a [`RefreshSummary`] row to a CSV log.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, summary: &RefreshSummary) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "appending refresh log record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(summary)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_append_record_creates_file() {
        let path = temp_path("crowdspeed_test_create.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        let summary = RefreshSummary::default();
        append_record(&path, &summary).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.is_empty());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("crowdspeed_test_header.csv");
        let _ = fs::remove_file(&path);

        let summary = RefreshSummary::default();
        append_record(&path, &summary).unwrap();
        append_record(&path, &summary).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_two_rows() {
        let path = temp_path("crowdspeed_test_rows.csv");
        let _ = fs::remove_file(&path);

        let summary = RefreshSummary::default();
        append_record(&path, &summary).unwrap();
        append_record(&path, &summary).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // 1 header + 2 data rows
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        fs::remove_file(&path).unwrap();
    }
}
