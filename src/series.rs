//! Core measurement-series types shared by the normalizer, joiner and
//! reporters.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

/// One cleaned feed row: a timezone-naive instant and a numeric measurement
/// (speed in kph, or a crowd count).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Reading {
    /// Timestamp floored to the start of its minute. Used only as a join key,
    /// never as row identity.
    pub fn minute(&self) -> NaiveDateTime {
        truncate_to_minute(self.timestamp)
    }
}

/// Floors a timestamp to the start of its minute.
pub fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// A cleaned measurement series for one feed.
///
/// Invariant: `readings` is sorted ascending by timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub label: String,
    pub readings: Vec<Reading>,
}

impl Series {
    /// Builds a series, sorting the readings chronologically. The sort is
    /// stable, so rows sharing a timestamp keep their input order.
    pub fn new(label: impl Into<String>, mut readings: Vec<Reading>) -> Self {
        readings.sort_by_key(|r| r.timestamp);
        Series {
            label: label.into(),
            readings,
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// The row with the maximum value, or `None` for an empty series.
    /// On ties the first occurrence (in chronological order) wins.
    pub fn max_reading(&self) -> Option<Reading> {
        self.readings.iter().copied().fold(None, |best, r| match best {
            None => Some(r),
            Some(b) if r.value > b.value => Some(r),
            Some(_) => best,
        })
    }
}
