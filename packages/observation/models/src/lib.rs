#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crowd observation, location, and flow types.
//!
//! This crate defines the canonical record types shared across the whole
//! crowd-flow system: the normalized [`Observation`] produced by ingestion,
//! the derived views consumed by the dashboard ([`LocationEntry`],
//! [`ChartPoint`]), and the inputs and outputs of the gravity flow
//! estimator ([`FlowPoint`], [`LinkDefinition`], [`CalculatedLinkVolume`],
//! [`PairVolume`]).

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One timestamped, geo-located crowd-count record.
///
/// `timestamp` is kept exactly as it appeared in the source so that
/// date-prefix matching operates on the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// ISO-8601 date-time with UTC offset (e.g. `2025-01-01T08:00:00+09:00`).
    pub timestamp: String,
    /// Number of people observed. May be fractional.
    pub people_count: f64,
    /// Derived congestion index accompanying the raw count.
    pub people_occupancy: f64,
    /// Opaque sensor identifier.
    pub location_id: String,
    /// Display name, used as the practical identity for grouping.
    pub location_name: String,
    /// Latitude in degrees. Always finite.
    pub latitude: f64,
    /// Longitude in degrees. Always finite.
    pub longitude: f64,
}

impl Observation {
    /// Returns the date portion of the timestamp (everything before the
    /// `T` separator, or the whole string when there is none).
    #[must_use]
    pub fn date(&self) -> &str {
        self.timestamp
            .split_once('T')
            .map_or(self.timestamp.as_str(), |(date, _)| date)
    }
}

/// A distinct monitored location, with the coordinates it was first seen at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEntry {
    /// Location display name.
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// One point of a per-location hourly series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    /// Axis label, `"<hour>:00"` (hour not zero-padded).
    pub time: String,
    /// People count for this row.
    pub count: f64,
    /// Hour of day used for ordering.
    pub hour_value: u32,
}

/// How the hour of day is derived from an offset-carrying timestamp.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HourPolicy {
    /// Wall-clock hour at the offset written in the timestamp itself.
    #[default]
    Embedded,
    /// Hour after normalizing the timestamp to UTC.
    Utc,
    /// Hour in the time zone of the machine evaluating the query.
    Local,
}

/// A weighted point fed to the gravity flow estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPoint {
    /// Identity used to resolve [`LinkDefinition`] endpoints.
    pub id: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Population proxy (people count).
    pub people: f64,
}

impl From<&Observation> for FlowPoint {
    fn from(obs: &Observation) -> Self {
        Self {
            id: obs.location_name.clone(),
            lat: obs.latitude,
            lng: obs.longitude,
            people: obs.people_count,
        }
    }
}

/// A predefined pair of locations for which flow is estimated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDefinition {
    /// Id of the origin point.
    #[serde(alias = "from")]
    pub from_id: String,
    /// Id of the destination point.
    #[serde(alias = "to")]
    pub to_id: String,
}

impl LinkDefinition {
    /// Creates a link between two point ids.
    #[must_use]
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
        }
    }
}

/// Estimated volume along a predefined link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedLinkVolume {
    /// Origin latitude.
    pub from_lat: f64,
    /// Origin longitude.
    pub from_lng: f64,
    /// Destination latitude.
    pub to_lat: f64,
    /// Destination longitude.
    pub to_lng: f64,
    /// Gravity-model volume. Always finite and non-negative.
    pub volume: f64,
}

/// Estimated volume between one unordered pair of snapshot points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairVolume {
    /// Id of the first point.
    pub source: String,
    /// Id of the second point.
    pub target: String,
    /// `[lng, lat]` of the first point.
    pub source_coords: [f64; 2],
    /// `[lng, lat]` of the second point.
    pub target_coords: [f64; 2],
    /// Gravity-model volume, or `None` when the pair is undefined
    /// (collocated points without a distance floor).
    pub value: Option<f64>,
}

/// Tuning constants for `k * (p_i * p_j) / (d + min_distance)^n`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityParams {
    /// Scale factor.
    pub k: f64,
    /// Distance-decay exponent.
    pub n: f64,
    /// Distance floor added before exponentiation.
    #[serde(alias = "minD")]
    pub min_distance: f64,
}

impl GravityParams {
    /// Defaults for link-driven estimation over haversine meters.
    #[must_use]
    pub const fn link_defaults() -> Self {
        Self {
            k: 100.0,
            n: 0.5,
            min_distance: 100.0,
        }
    }

    /// Defaults for all-pairs estimation over planar degree distance.
    #[must_use]
    pub const fn all_pairs_defaults() -> Self {
        Self {
            k: 0.001,
            n: 1.5,
            min_distance: 0.0,
        }
    }
}

impl Default for GravityParams {
    fn default() -> Self {
        Self::link_defaults()
    }
}

/// Everything the flow estimator needs besides the snapshot itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSettings {
    /// Predefined links evaluated in link-driven mode.
    pub links: Vec<LinkDefinition>,
    /// Parameters for link-driven mode.
    pub link_params: GravityParams,
    /// Parameters for all-pairs mode.
    pub pair_params: GravityParams,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            links: Vec::new(),
            link_params: GravityParams::link_defaults(),
            pair_params: GravityParams::all_pairs_defaults(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(timestamp: &str) -> Observation {
        Observation {
            timestamp: timestamp.to_string(),
            people_count: 10.0,
            people_occupancy: 0.5,
            location_id: "id-1".to_string(),
            location_name: "Station".to_string(),
            latitude: 38.26,
            longitude: 140.88,
        }
    }

    #[test]
    fn date_is_prefix_before_separator() {
        assert_eq!(obs("2025-01-01T08:00:00+09:00").date(), "2025-01-01");
    }

    #[test]
    fn date_without_separator_is_whole_string() {
        assert_eq!(obs("2025-01-01").date(), "2025-01-01");
        assert_eq!(obs("").date(), "");
    }

    #[test]
    fn hour_policy_round_trips_through_strings() {
        for policy in [HourPolicy::Embedded, HourPolicy::Utc, HourPolicy::Local] {
            let parsed: HourPolicy = policy.as_ref().parse().unwrap();
            assert_eq!(parsed, policy);
        }
        assert_eq!(HourPolicy::default(), HourPolicy::Embedded);
    }

    #[test]
    fn observation_serializes_camel_case() {
        let json = serde_json::to_value(obs("2025-01-01T08:00:00+09:00")).unwrap();
        assert_eq!(json["peopleCount"], 10.0);
        assert_eq!(json["locationName"], "Station");
    }

    #[test]
    fn link_definition_accepts_short_aliases() {
        let link: LinkDefinition =
            serde_json::from_str(r#"{"from": "A", "to": "B"}"#).unwrap();
        assert_eq!(link, LinkDefinition::new("A", "B"));
    }

    #[test]
    fn flow_point_uses_location_name_as_id() {
        let point = FlowPoint::from(&obs("2025-01-01T08:00:00+09:00"));
        assert_eq!(point.id, "Station");
        assert!((point.people - 10.0).abs() < f64::EPSILON);
    }
}
