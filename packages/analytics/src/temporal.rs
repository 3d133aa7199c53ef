//! Date and hour-of-day indexing over observation timestamps.
//!
//! Dates are compared textually: the date of an observation is the part of
//! its timestamp before the `T` separator, and date filtering is a prefix
//! match on the raw timestamp. Hours are extracted according to an explicit
//! [`HourPolicy`].

use std::collections::BTreeSet;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike as _, Utc};
use crowd_flow_observation_models::{HourPolicy, Observation};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Returns the distinct, non-empty observation dates in ascending order.
///
/// Lexical order equals chronological order for fixed-width `YYYY-MM-DD`
/// dates.
#[must_use]
pub fn available_dates(dataset: &[Observation]) -> Vec<String> {
    dataset
        .iter()
        .map(Observation::date)
        .filter(|d| !d.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Returns the observations whose timestamp starts with `date`, in dataset
/// order.
///
/// This is a textual prefix match, so a partial date such as `"2025-01"`
/// matches the whole month. An empty `date` means "no date selected" and
/// yields nothing.
#[must_use]
pub fn filter_by_date<'a>(dataset: &'a [Observation], date: &str) -> Vec<&'a Observation> {
    if date.is_empty() {
        return Vec::new();
    }
    dataset
        .iter()
        .filter(|o| o.timestamp.starts_with(date))
        .collect()
}

/// Keeps the rows whose hour under `policy` equals `hour`. Rows with
/// unparsable timestamps are dropped.
#[must_use]
pub fn filter_by_hour<'a>(
    rows: &[&'a Observation],
    hour: u32,
    policy: HourPolicy,
) -> Vec<&'a Observation> {
    rows.iter()
        .copied()
        .filter(|o| observation_hour(&o.timestamp, policy) == Some(hour))
        .collect()
}

/// Extracts the hour of day (`0..24`) from a timestamp.
///
/// Offset-carrying timestamps are interpreted per `policy`. Timestamps
/// without an offset are read as wall-clock time under every policy, and a
/// bare date is midnight. Returns `None` if the timestamp does not parse.
#[must_use]
pub fn observation_hour(timestamp: &str, policy: HourPolicy) -> Option<u32> {
    let ts = timestamp.trim();

    let with_offset = DateTime::parse_from_rfc3339(ts)
        .or_else(|_| DateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f%z"));

    if let Ok(dt) = with_offset {
        return Some(match policy {
            HourPolicy::Embedded => dt.hour(),
            HourPolicy::Utc => dt.with_timezone(&Utc).hour(),
            HourPolicy::Local => dt.with_timezone(&Local).hour(),
        });
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(ts, fmt).ok())
    {
        return Some(naive.hour());
    }

    NaiveDate::parse_from_str(ts, "%Y-%m-%d").ok().map(|_| 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(timestamp: &str, name: &str) -> Observation {
        Observation {
            timestamp: timestamp.to_string(),
            people_count: 1.0,
            people_occupancy: 0.05,
            location_id: format!("id-{name}"),
            location_name: name.to_string(),
            latitude: 38.26,
            longitude: 140.88,
        }
    }

    #[test]
    fn dates_are_distinct_and_ascending() {
        let data = vec![
            obs("2025-01-02T08:00:00+09:00", "A"),
            obs("2025-01-01T09:00:00+09:00", "A"),
            obs("2025-01-02T10:00:00+09:00", "B"),
            obs("", "C"),
        ];
        let dates = available_dates(&data);
        assert_eq!(dates, vec!["2025-01-01", "2025-01-02"]);
        assert_eq!(available_dates(&data), dates);
    }

    #[test]
    fn date_filter_is_prefix_match_in_order() {
        let data = vec![
            obs("2025-01-01T08:00:00+09:00", "A"),
            obs("2025-01-02T08:00:00+09:00", "B"),
            obs("2025-01-01T09:00:00+09:00", "C"),
        ];
        let names: Vec<&str> = filter_by_date(&data, "2025-01-01")
            .iter()
            .map(|o| o.location_name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(filter_by_date(&data, "2025-01").len(), 3);
    }

    #[test]
    fn empty_date_selects_nothing() {
        let data = vec![obs("2025-01-01T08:00:00+09:00", "A")];
        assert!(filter_by_date(&data, "").is_empty());
    }

    #[test]
    fn late_evening_row_matches_its_written_hour() {
        let data = vec![obs("2025-01-01T23:30:00+09:00", "A")];
        let rows: Vec<&Observation> = data.iter().collect();
        assert_eq!(filter_by_hour(&rows, 23, HourPolicy::Embedded).len(), 1);
        assert!(filter_by_hour(&rows, 14, HourPolicy::Embedded).is_empty());
    }

    #[test]
    fn utc_policy_normalizes_the_offset() {
        assert_eq!(
            observation_hour("2025-01-01T23:30:00+09:00", HourPolicy::Utc),
            Some(14)
        );
        assert_eq!(
            observation_hour("2025-01-01T02:00:00+09:00", HourPolicy::Utc),
            Some(17)
        );
    }

    #[test]
    fn local_policy_matches_chrono_local_conversion() {
        let ts = "2025-01-01T23:30:00+09:00";
        let expected = DateTime::parse_from_rfc3339(ts)
            .unwrap()
            .with_timezone(&Local)
            .hour();
        assert_eq!(observation_hour(ts, HourPolicy::Local), Some(expected));
    }

    #[test]
    fn accepts_compact_offsets_and_naive_timestamps() {
        assert_eq!(
            observation_hour("2025-01-01T07:00:00+0900", HourPolicy::Embedded),
            Some(7)
        );
        assert_eq!(
            observation_hour("2025-01-01T07:15:00", HourPolicy::Utc),
            Some(7)
        );
        assert_eq!(observation_hour("2025-01-01", HourPolicy::Embedded), Some(0));
    }

    #[test]
    fn unparsable_timestamps_are_excluded() {
        let data = vec![
            obs("garbage", "A"),
            obs("2025-01-01T05:00:00+09:00", "B"),
        ];
        let rows: Vec<&Observation> = data.iter().collect();
        let kept = filter_by_hour(&rows, 5, HourPolicy::Embedded);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].location_name, "B");
        assert_eq!(observation_hour("garbage", HourPolicy::Local), None);
    }
}
