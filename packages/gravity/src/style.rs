//! Relative intensity of link volumes for map rendering.

use crowd_flow_observation_models::CalculatedLinkVolume;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Minimum line weight, in pixels.
pub const MIN_WEIGHT: f64 = 3.0;

/// Additional weight at the maximum volume, in pixels.
pub const WEIGHT_RANGE: f64 = 9.0;

/// Coarse intensity band of a link relative to the busiest link.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum LinkIntensity {
    /// Ratio at or below 0.4
    Low,
    /// Ratio above 0.4, at or below 0.7
    Medium,
    /// Ratio above 0.7
    High,
}

impl LinkIntensity {
    /// Classifies a volume ratio in `[0, 1]`.
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.7 {
            Self::High
        } else if ratio > 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Hex color conventionally used for this band.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "#3b82f6",
            Self::Medium => "#f59e0b",
            Self::High => "#ef4444",
        }
    }
}

/// Rendering hints for one link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkStyle {
    /// Volume divided by the maximum volume, or `0` when the maximum is `0`.
    pub ratio: f64,
    /// Intensity band derived from `ratio`.
    pub intensity: LinkIntensity,
    /// Line weight in pixels.
    pub weight: f64,
}

/// Computes the style of a volume given the largest volume in its set.
#[must_use]
pub fn link_style(volume: f64, max_volume: f64) -> LinkStyle {
    let ratio = if max_volume > 0.0 {
        volume / max_volume
    } else {
        0.0
    };

    LinkStyle {
        ratio,
        intensity: LinkIntensity::from_ratio(ratio),
        weight: ratio.mul_add(WEIGHT_RANGE, MIN_WEIGHT),
    }
}

/// Styles every link relative to the busiest one, preserving order.
#[must_use]
pub fn style_links(volumes: &[CalculatedLinkVolume]) -> Vec<LinkStyle> {
    let max_volume = volumes.iter().map(|v| v.volume).fold(0.0, f64::max);
    volumes
        .iter()
        .map(|v| link_style(v.volume, max_volume))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(volume: f64) -> CalculatedLinkVolume {
        CalculatedLinkVolume {
            from_lat: 0.0,
            from_lng: 0.0,
            to_lat: 0.0,
            to_lng: 0.0,
            volume,
        }
    }

    #[test]
    fn bands_follow_ratio_thresholds() {
        assert_eq!(LinkIntensity::from_ratio(0.0), LinkIntensity::Low);
        assert_eq!(LinkIntensity::from_ratio(0.4), LinkIntensity::Low);
        assert_eq!(LinkIntensity::from_ratio(0.41), LinkIntensity::Medium);
        assert_eq!(LinkIntensity::from_ratio(0.7), LinkIntensity::Medium);
        assert_eq!(LinkIntensity::from_ratio(0.71), LinkIntensity::High);
    }

    #[test]
    fn busiest_link_gets_full_weight() {
        let styles = style_links(&[link(50.0), link(100.0), link(10.0)]);
        assert!((styles[1].weight - 12.0).abs() < f64::EPSILON);
        assert_eq!(styles[1].intensity, LinkIntensity::High);
        assert!((styles[0].ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(styles[0].intensity, LinkIntensity::Medium);
        assert_eq!(styles[2].intensity, LinkIntensity::Low);
    }

    #[test]
    fn all_zero_volumes_get_minimum_weight() {
        let styles = style_links(&[link(0.0), link(0.0)]);
        assert!(
            styles
                .iter()
                .all(|s| s.ratio.abs() < f64::EPSILON && (s.weight - MIN_WEIGHT).abs() < f64::EPSILON)
        );
    }
}
