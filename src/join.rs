//! Minute-bucket inner join of the crowd and speed series.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::series::Series;

/// One crowd reading matched with one speed reading sharing the same
/// minute-truncated timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JoinedRecord {
    pub minute: NaiveDateTime,
    pub count: f64,
    pub speed: f64,
}

/// Inner-joins the two series on equality of the minute-truncated timestamp.
///
/// Rows without a partner on the other side are excluded. When several rows
/// on either side share a minute, every pairing is emitted (full cross per
/// key). Output follows the crowd series' chronological order, so it is
/// sorted by minute.
///
/// An empty result means no overlapping minutes; callers report that as
/// "no matching data" rather than rendering an empty chart.
pub fn join_on_minute(crowd: &Series, speed: &Series) -> Vec<JoinedRecord> {
    let mut speed_by_minute: HashMap<NaiveDateTime, Vec<f64>> = HashMap::new();
    for r in &speed.readings {
        speed_by_minute.entry(r.minute()).or_default().push(r.value);
    }

    let mut joined = Vec::new();
    for c in &crowd.readings {
        let minute = c.minute();
        if let Some(speeds) = speed_by_minute.get(&minute) {
            for &speed in speeds {
                joined.push(JoinedRecord {
                    minute,
                    count: c.value,
                    speed,
                });
            }
        }
    }

    joined
}
