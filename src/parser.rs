//! CSV feed normalizer.
//!
//! Turns raw spreadsheet-export text into a clean, chronologically ordered
//! [`Series`]. Rows whose timestamp or measurement fail to parse are dropped
//! silently, as are structurally malformed rows; a missing column or a feed
//! with zero usable rows is an error.

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use tracing::debug;

use crate::series::{Reading, Series};

/// Timestamp formats observed across the source spreadsheets. Tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses a timestamp cell, returning `None` if no known format matches.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Normalizes raw CSV text into a clean series.
///
/// `timestamp_column` and `value_column` name the header cells to read; the
/// source sheets are inconsistent about these, so they come from
/// configuration rather than being hard-coded here.
///
/// # Errors
///
/// Returns an error if the header row is missing either column, or if no row
/// yields both a parseable timestamp and a finite numeric measurement.
/// Structurally malformed rows (wrong field count) are counted as dropped,
/// the same as rows with unparseable values.
pub fn parse_series(
    csv_text: &str,
    label: &str,
    timestamp_column: &str,
    value_column: &str,
) -> Result<Series> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers = rdr
        .headers()
        .with_context(|| format!("feed {label:?} has no header row"))?
        .clone();

    let ts_idx = column_index(&headers, timestamp_column)
        .with_context(|| missing_column(label, timestamp_column, &headers))?;
    let value_idx = column_index(&headers, value_column)
        .with_context(|| missing_column(label, value_column, &headers))?;

    let mut readings = Vec::new();
    let mut dropped = 0usize;

    for record in rdr.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                debug!(feed = label, %err, "skipping malformed row");
                dropped += 1;
                continue;
            }
        };

        let timestamp = record.get(ts_idx).and_then(parse_timestamp);
        let value = record
            .get(value_idx)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite());

        match (timestamp, value) {
            (Some(timestamp), Some(value)) => readings.push(Reading { timestamp, value }),
            _ => dropped += 1,
        }
    }

    if readings.is_empty() {
        bail!(
            "feed {label:?} produced no usable rows ({dropped} dropped); \
             check the {timestamp_column:?} and {value_column:?} columns"
        );
    }

    debug!(feed = label, rows = readings.len(), dropped, "feed normalized");

    Ok(Series::new(label, readings))
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn missing_column(label: &str, name: &str, headers: &csv::StringRecord) -> String {
    let available: Vec<&str> = headers.iter().collect();
    format!("feed {label:?} has no column {name:?} (headers: {available:?})")
}
