#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard views over a crowd-count dataset.
//!
//! Every view is a pure function of the dataset and the current
//! [`Selection`]. Nothing is cached: callers recompute whenever the
//! dataset, date, hour, or location changes, and repeating a computation
//! always yields the same result.

pub mod catalog;
pub mod series;
pub mod temporal;

use crowd_flow_observation_models::{
    CalculatedLinkVolume, ChartPoint, FlowSettings, HourPolicy, LocationEntry, Observation,
    PairVolume,
};
use serde::ser::SerializeMap as _;
use serde::{Serialize, Serializer};

pub use catalog::unique_locations;
pub use series::chart_data;
pub use temporal::{available_dates, filter_by_date, filter_by_hour, observation_hour};

/// The user's current date, hour, and location choice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    /// Date prefix (`YYYY-MM-DD`). Empty means no date selected.
    pub date: String,
    /// Hour of day, `0..24`.
    pub hour: u32,
    /// Location name. Empty means no location selected.
    pub location: String,
    /// How hours are derived from timestamps.
    pub hour_policy: HourPolicy,
}

impl Selection {
    /// The selection a freshly loaded dataset starts with: its earliest
    /// date and the location of its first row.
    #[must_use]
    pub fn initial(dataset: &[Observation], hour: u32, hour_policy: HourPolicy) -> Self {
        Self {
            date: available_dates(dataset).into_iter().next().unwrap_or_default(),
            hour,
            location: dataset
                .first()
                .map(|o| o.location_name.clone())
                .unwrap_or_default(),
            hour_policy,
        }
    }
}

/// Rows observed on `date` at `hour`, in dataset order.
#[must_use]
pub fn hourly_snapshot<'a>(
    dataset: &'a [Observation],
    date: &str,
    hour: u32,
    policy: HourPolicy,
) -> Vec<&'a Observation> {
    filter_by_hour(&filter_by_date(dataset, date), hour, policy)
}

/// The snapshot row for `location`, falling back to the first snapshot row.
#[must_use]
pub fn current_focus<'a>(snapshot: &[&'a Observation], location: &str) -> Option<&'a Observation> {
    snapshot
        .iter()
        .find(|o| o.location_name == location)
        .or_else(|| snapshot.first())
        .copied()
}

/// Headline counts for a loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    /// Number of admitted observations.
    pub observations: usize,
    /// Number of distinct dates.
    pub days: usize,
    /// Number of distinct location names across all dates.
    pub locations: usize,
}

impl DatasetSummary {
    /// Summarizes `dataset`.
    #[must_use]
    pub fn of(dataset: &[Observation]) -> Self {
        let all: Vec<&Observation> = dataset.iter().collect();
        Self {
            observations: dataset.len(),
            days: available_dates(dataset).len(),
            locations: unique_locations(&all).len(),
        }
    }
}

/// Every derived view for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Distinct dates in the dataset.
    pub available_dates: Vec<String>,
    /// Locations observed on the selected date.
    pub unique_locations: Vec<LocationEntry>,
    /// Rows for the selected date and hour.
    pub hourly_snapshot: Vec<Observation>,
    /// Focused row of the snapshot; serialized as `{}` when absent.
    #[serde(serialize_with = "serialize_focus")]
    pub current_focus: Option<Observation>,
    /// Hourly series of the selected location on the selected date.
    pub chart_data: Vec<ChartPoint>,
    /// Volumes along the configured links.
    pub link_volumes: Vec<CalculatedLinkVolume>,
    /// Volumes between every pair of snapshot points.
    pub pair_volumes: Vec<PairVolume>,
}

impl DashboardView {
    /// Computes all views from scratch.
    #[must_use]
    pub fn compute(dataset: &[Observation], selection: &Selection, flow: &FlowSettings) -> Self {
        let by_date = filter_by_date(dataset, &selection.date);
        let snapshot = filter_by_hour(&by_date, selection.hour, selection.hour_policy);
        let points = crowd_flow_gravity::points_from_snapshot(&snapshot);

        log::trace!(
            "Computing views for date={:?} hour={} location={:?}: {} rows, {} in snapshot",
            selection.date,
            selection.hour,
            selection.location,
            by_date.len(),
            snapshot.len()
        );

        Self {
            available_dates: available_dates(dataset),
            unique_locations: unique_locations(&by_date),
            current_focus: current_focus(&snapshot, &selection.location).cloned(),
            chart_data: chart_data(&by_date, &selection.location, selection.hour_policy),
            link_volumes: crowd_flow_gravity::link_volumes(
                &points,
                &flow.links,
                &flow.link_params,
            ),
            pair_volumes: crowd_flow_gravity::all_pair_volumes(&points, &flow.pair_params),
            hourly_snapshot: snapshot.into_iter().cloned().collect(),
        }
    }
}

fn serialize_focus<S: Serializer>(
    focus: &Option<Observation>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match focus {
        Some(obs) => obs.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}
