//! Mean speed per distinct crowd-count value.

use serde::Serialize;

use crate::join::JoinedRecord;

/// One row of the correlation table: every matched speed for a given crowd
/// count, collapsed into an arithmetic mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountGroup {
    pub count: f64,
    pub mean_speed: f64,
    pub samples: usize,
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Groups joined records by crowd-count value and averages the matched
/// speeds. One output row per distinct count, ascending by count. No
/// weighting and no outlier handling.
pub fn mean_speed_per_count(records: &[JoinedRecord]) -> Vec<CountGroup> {
    let mut sorted: Vec<&JoinedRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.count.total_cmp(&b.count));

    let mut groups: Vec<(f64, Vec<f64>)> = Vec::new();
    for rec in sorted {
        match groups.last_mut() {
            Some((count, speeds)) if *count == rec.count => speeds.push(rec.speed),
            _ => groups.push((rec.count, vec![rec.speed])),
        }
    }

    groups
        .into_iter()
        .map(|(count, speeds)| CountGroup {
            count,
            mean_speed: mean(&speeds),
            samples: speeds.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(count: f64, speed: f64) -> JoinedRecord {
        JoinedRecord {
            minute: NaiveDate::from_ymd_opt(2024, 12, 1)
                .unwrap()
                .and_hms_opt(10, 5, 0)
                .unwrap(),
            count,
            speed,
        }
    }

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_normal_values() {
        assert_eq!(mean(&[10.0, 20.0]), 15.0);
    }

    #[test]
    fn test_groups_by_count_and_averages() {
        let records = vec![rec(3.0, 10.0), rec(3.0, 20.0), rec(5.0, 30.0)];

        let groups = mean_speed_per_count(&records);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].count, 3.0);
        assert_eq!(groups[0].mean_speed, 15.0);
        assert_eq!(groups[0].samples, 2);
        assert_eq!(groups[1].count, 5.0);
        assert_eq!(groups[1].mean_speed, 30.0);
        assert_eq!(groups[1].samples, 1);
    }

    #[test]
    fn test_output_ascending_by_count() {
        let records = vec![rec(5.0, 1.0), rec(2.0, 2.0), rec(9.0, 3.0), rec(2.0, 4.0)];

        let counts: Vec<f64> = mean_speed_per_count(&records)
            .iter()
            .map(|g| g.count)
            .collect();
        assert_eq!(counts, vec![2.0, 5.0, 9.0]);
    }

    #[test]
    fn test_empty_records_empty_output() {
        assert!(mean_speed_per_count(&[]).is_empty());
    }
}
