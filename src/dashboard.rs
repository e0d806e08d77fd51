//! Per-refresh dashboard snapshot builder.
//!
//! Each refresh re-runs fetch → clean → join → aggregate. Sections are
//! isolated: a fetch or parse failure is recorded inline on its own section
//! and the remaining sections still render. An empty join is a distinct
//! non-fatal outcome, not an error and not an empty chart.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::aggregate::{CountGroup, mean_speed_per_count};
use crate::config::{FeedConfig, Settings};
use crate::fetch::{HttpClient, fetch_text};
use crate::join::{JoinedRecord, join_on_minute};
use crate::parser::parse_series;
use crate::report;
use crate::series::{Reading, Series};

/// Outcome of one dashboard section.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Ok(T),
    /// The join found no overlapping minutes. Non-fatal.
    NoMatchingData,
    Error { message: String },
}

impl<T> Section<T> {
    pub fn as_ok(&self) -> Option<&T> {
        match self {
            Section::Ok(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Section::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// Maximum of a series, minute-truncated for display.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Extremum {
    pub value: f64,
    pub minute: NaiveDateTime,
}

/// One measurement-over-time chart: the cleaned points plus its extremum.
#[derive(Debug, Serialize)]
pub struct SeriesChart {
    pub label: String,
    pub points: Vec<Reading>,
    pub max: Option<Extremum>,
}

/// The crowd-vs-speed correlation view: raw matched pairs for the scatter
/// plot and the per-count means.
#[derive(Debug, Serialize)]
pub struct Correlation {
    pub matched: Vec<JoinedRecord>,
    pub per_count: Vec<CountGroup>,
}

/// Everything one dashboard refresh produces.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub clock: String,
    pub speed: Section<SeriesChart>,
    pub crowd: Section<SeriesChart>,
    pub correlation: Section<Correlation>,
}

/// Runs one full refresh: fetch both feeds concurrently, normalize, join on
/// the truncated minute, aggregate. Never fails as a whole; per-section
/// failures land inside the snapshot.
#[tracing::instrument(skip(client, settings))]
pub async fn build_snapshot<C: HttpClient>(client: &C, settings: &Settings) -> Snapshot {
    let (speed_body, crowd_body) = tokio::join!(
        fetch_text(client, &settings.speed.url),
        fetch_text(client, &settings.crowd.url),
    );

    assemble_snapshot(settings, speed_body, crowd_body)
}

/// Assembles a snapshot from already-fetched feed bodies. Split from
/// [`build_snapshot`] so the section taxonomy can be exercised without a
/// live transport.
fn assemble_snapshot(
    settings: &Settings,
    speed_body: Result<String>,
    crowd_body: Result<String>,
) -> Snapshot {
    let speed_series = normalize_section(&settings.speed, speed_body);
    let crowd_series = normalize_section(&settings.crowd, crowd_body);

    let correlation = match (&crowd_series, &speed_series) {
        (Ok(crowd), Ok(speed)) => {
            let matched = join_on_minute(crowd, speed);
            if matched.is_empty() {
                warn!("no matching data after truncating timestamps to the minute");
                Section::NoMatchingData
            } else {
                let per_count = mean_speed_per_count(&matched);
                info!(
                    matched = matched.len(),
                    distinct_counts = per_count.len(),
                    "correlation computed"
                );
                Section::Ok(Correlation { matched, per_count })
            }
        }
        // the failed feed already carries its own inline error
        _ => Section::Error {
            message: "correlation unavailable: one or both feeds failed".to_string(),
        },
    };

    // one instant for both generated_at and the clock line
    let generated_at = Utc::now();

    Snapshot {
        generated_at,
        clock: report::clock_line(generated_at),
        speed: chart_section(speed_series),
        crowd: chart_section(crowd_series),
        correlation,
    }
}

fn normalize_section(feed: &FeedConfig, body: Result<String>) -> Result<Series> {
    let body = body?;
    let series = parse_series(&body, &feed.label, &feed.timestamp_column, &feed.value_column)?;
    info!(feed = %feed.label, rows = series.len(), "feed ready");
    Ok(series)
}

fn chart_section(result: Result<Series>) -> Section<SeriesChart> {
    match result {
        Ok(series) => {
            let max = series.max_reading().map(|r| Extremum {
                value: r.value,
                minute: r.minute(),
            });
            Section::Ok(SeriesChart {
                label: series.label.clone(),
                points: series.readings,
                max,
            })
        }
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "dashboard section failed");
            Section::Error { message }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::NaiveDate;

    fn feed(label: &str, ts_col: &str, value_col: &str) -> FeedConfig {
        FeedConfig {
            label: label.to_string(),
            url: format!("http://example.invalid/{label}.csv"),
            timestamp_column: ts_col.to_string(),
            value_column: value_col.to_string(),
        }
    }

    fn settings() -> Settings {
        Settings {
            speed: feed("speed", "Timestamp (ESP1)", "Final Speed"),
            crowd: feed("crowd", "Timestamp", "Count"),
        }
    }

    fn speed_body(rows: &str) -> Result<String> {
        Ok(format!("Timestamp (ESP1),Final Speed\n{rows}"))
    }

    fn crowd_body(rows: &str) -> Result<String> {
        Ok(format!("Timestamp,Count\n{rows}"))
    }

    #[test]
    fn test_failed_feed_leaves_sibling_section_intact() {
        let snapshot = assemble_snapshot(
            &settings(),
            Err(anyhow!("connection refused")),
            crowd_body("2024-12-01 10:05:00,4\n"),
        );

        let message = snapshot.speed.error_message().expect("speed should fail");
        assert!(message.contains("connection refused"));

        let crowd = snapshot.crowd.as_ok().expect("crowd should still render");
        assert_eq!(crowd.points.len(), 1);

        // correlation cannot be computed with only one feed
        assert!(snapshot.correlation.error_message().is_some());
    }

    #[test]
    fn test_disjoint_minutes_yield_no_matching_data_section() {
        let snapshot = assemble_snapshot(
            &settings(),
            speed_body("2024-12-01 09:00:00,20.0\n"),
            crowd_body("2024-12-01 10:00:00,4\n"),
        );

        assert!(snapshot.speed.as_ok().is_some());
        assert!(snapshot.crowd.as_ok().is_some());
        assert!(matches!(
            snapshot.correlation,
            Section::NoMatchingData
        ));
    }

    #[test]
    fn test_overlapping_minutes_yield_correlation() {
        let snapshot = assemble_snapshot(
            &settings(),
            speed_body("2024-12-01 10:05:03,12.5\n2024-12-01 10:05:41,18.0\n"),
            crowd_body("2024-12-01 10:05:10,3\n"),
        );

        let correlation = snapshot.correlation.as_ok().expect("minutes overlap");
        assert_eq!(correlation.matched.len(), 2);
        assert_eq!(correlation.per_count.len(), 1);
        assert_eq!(correlation.per_count[0].mean_speed, 15.25);
    }

    #[test]
    fn test_clock_line_derived_from_generated_at() {
        let snapshot = assemble_snapshot(
            &settings(),
            Err(anyhow!("down")),
            Err(anyhow!("down")),
        );

        assert_eq!(
            snapshot.clock,
            crate::report::clock_line(snapshot.generated_at)
        );
    }

    #[test]
    fn test_chart_section_carries_extremum() {
        let series = Series::new(
            "speed",
            vec![
                Reading {
                    timestamp: NaiveDate::from_ymd_opt(2024, 12, 1)
                        .unwrap()
                        .and_hms_opt(10, 5, 30)
                        .unwrap(),
                    value: 40.0,
                },
                Reading {
                    timestamp: NaiveDate::from_ymd_opt(2024, 12, 1)
                        .unwrap()
                        .and_hms_opt(10, 6, 0)
                        .unwrap(),
                    value: 12.0,
                },
            ],
        );

        let section = chart_section(Ok(series));
        let chart = section.as_ok().unwrap();
        assert_eq!(chart.points.len(), 2);
        let max = chart.max.unwrap();
        assert_eq!(max.value, 40.0);
        assert_eq!(
            max.minute,
            NaiveDate::from_ymd_opt(2024, 12, 1)
                .unwrap()
                .and_hms_opt(10, 5, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_chart_section_records_error_inline() {
        let section = chart_section(Err(anyhow!("boom")));
        assert_eq!(section.error_message(), Some("boom"));
    }

    #[test]
    fn test_normalize_section_propagates_fetch_error() {
        let cfg = feed("speed", "Timestamp (ESP1)", "Final Speed");
        let result = normalize_section(&cfg, Err(anyhow!("connection refused")));
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_section_parses_body() {
        let cfg = feed("crowd", "Timestamp", "Count");
        let body = "Timestamp,Count\n2024-12-01 10:05:00,4\n".to_string();
        let series = normalize_section(&cfg, Ok(body)).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_section_serializes_with_status_tag() {
        let section: Section<Correlation> = Section::NoMatchingData;
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["status"], "no_matching_data");

        let section: Section<Correlation> = Section::Error {
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "boom");
    }
}
