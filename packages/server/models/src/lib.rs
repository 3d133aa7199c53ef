#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crowd-flow server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the core observation types so the API contract can evolve on its
//! own.

use crowd_flow_gravity::style::{LinkIntensity, LinkStyle};
use crowd_flow_observation_models::{CalculatedLinkVolume, PairVolume};
use serde::{Deserialize, Serialize};

/// Server health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Selection parameters shared by the view endpoints.
///
/// Omitted fields fall back to the dataset's initial selection (earliest
/// date, first row's location) and the playback cursor's hour.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQueryParams {
    /// Date prefix, e.g. `2025-01-01`.
    pub date: Option<String>,
    /// Hour of day, `0..24`.
    pub hour: Option<u32>,
    /// Location name.
    pub location: Option<String>,
}

/// A link volume with its rendering hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLinkVolume {
    /// The estimated link volume.
    #[serde(flatten)]
    pub link: CalculatedLinkVolume,
    /// Volume relative to the busiest link.
    pub ratio: f64,
    /// Intensity band.
    pub intensity: LinkIntensity,
    /// Suggested line weight in pixels.
    pub weight: f64,
    /// Suggested line color.
    pub color: String,
}

impl ApiLinkVolume {
    /// Combines a link volume with its style.
    #[must_use]
    pub fn new(link: CalculatedLinkVolume, style: LinkStyle) -> Self {
        Self {
            link,
            ratio: style.ratio,
            intensity: style.intensity,
            weight: style.weight,
            color: style.intensity.color().to_string(),
        }
    }
}

/// Flow estimates for one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFlows {
    /// Date the snapshot was taken from.
    pub date: String,
    /// Hour the snapshot was taken at.
    pub hour: u32,
    /// Volumes along configured links.
    pub links: Vec<ApiLinkVolume>,
    /// Volumes between every pair of snapshot points.
    pub pairs: Vec<PairVolume>,
}

/// Playback cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlaybackStatus {
    /// Current hour.
    pub hour: u32,
    /// Whether the cursor is advancing automatically.
    pub playing: bool,
    /// Milliseconds between advances.
    pub period_ms: u64,
}

/// Body of `PUT /api/playback/hour`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SetHourRequest {
    /// New cursor position, `0..24`.
    pub hour: u32,
}

/// Error body returned on failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
