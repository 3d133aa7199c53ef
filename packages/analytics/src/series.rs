//! Per-location hourly series for charting.

use crowd_flow_observation_models::{ChartPoint, HourPolicy, Observation};

use crate::temporal::observation_hour;

/// Returns the rows for `location` as chart points, stable-sorted by hour.
///
/// Rows sharing an hour are all kept, in input order. An empty `location`
/// means "nothing selected" and yields an empty series. Rows whose
/// timestamp does not parse are skipped.
#[must_use]
pub fn chart_data(rows: &[&Observation], location: &str, policy: HourPolicy) -> Vec<ChartPoint> {
    if location.is_empty() {
        return Vec::new();
    }

    let mut points: Vec<ChartPoint> = rows
        .iter()
        .filter(|o| o.location_name == location)
        .filter_map(|o| {
            let hour = observation_hour(&o.timestamp, policy)?;
            Some(ChartPoint {
                time: format!("{hour}:00"),
                count: o.people_count,
                hour_value: hour,
            })
        })
        .collect();

    points.sort_by_key(|p| p.hour_value);
    points
}
