//! Plain-text summary strings for the dashboard: the GMT+7 clock line and
//! per-series extremum announcements.

use chrono::{DateTime, Datelike, FixedOffset, Utc};

use crate::series::Series;

/// The dashboard's display timezone (GMT+7).
pub fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).expect("offset within bounds")
}

/// Ordinal suffix for a day of month, with the 11th to 13th exception.
pub fn day_suffix(day: u32) -> &'static str {
    match day {
        11..=13 => "th",
        d => match d % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

/// Formats an instant as the dashboard clock line in GMT+7, e.g.
/// `"August 25th, 2026, 14:03:05"`.
pub fn clock_line(now: DateTime<Utc>) -> String {
    let local = now.with_timezone(&display_offset());
    format!(
        "{} {}{}, {}, {}",
        local.format("%B"),
        local.day(),
        day_suffix(local.day()),
        local.year(),
        local.format("%H:%M:%S"),
    )
}

/// Announcement for the maximum measurement in a cleaned series, with the
/// timestamp truncated to the minute for display. `None` for an empty
/// series; on ties the first occurrence wins.
pub fn extremum_line(series: &Series, unit: &str) -> Option<String> {
    let max = series.max_reading()?;
    Some(format!(
        "max {} {:.1} {} at {}",
        series.label,
        max.value,
        unit,
        max.minute().format("%Y-%m-%d %H:%M"),
    ))
}
