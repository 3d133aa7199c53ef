#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Gravity-model flow estimation between crowd sensors.
//!
//! Estimates an interaction volume between two weighted points as
//!
//! ```text
//! volume = k * (p_i * p_j) / (distance + min_distance)^n
//! ```
//!
//! Two modes are provided:
//!
//! * [`link_volumes`] evaluates a fixed set of [`LinkDefinition`]s using
//!   great-circle distance in meters. Links whose endpoints are missing from
//!   the snapshot, or whose volume would be undefined, are skipped.
//! * [`all_pair_volumes`] evaluates every unordered pair of points using
//!   planar degree distance. Undefined pairs are kept with a `None` value.
//!
//! Neither mode ever returns `NaN` or infinite volumes. The volumes are a
//! visualization heuristic, not a calibrated transportation model.

pub mod distance;
pub mod style;

use std::collections::HashMap;

use crowd_flow_observation_models::{
    CalculatedLinkVolume, FlowPoint, GravityParams, LinkDefinition, Observation, PairVolume,
};
use geo::Point;

use crate::distance::{haversine_distance, planar_distance};

/// Errors produced when validating gravity parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GravityError {
    /// A parameter was negative, `NaN`, or infinite.
    #[error("invalid gravity parameter {name} = {value}: must be finite and >= 0")]
    InvalidParameter {
        /// Parameter name (`k`, `n`, or `min_distance`).
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Checks that every parameter is finite and non-negative.
///
/// # Errors
///
/// Returns [`GravityError::InvalidParameter`] naming the first offending
/// parameter.
pub fn validate_params(params: &GravityParams) -> Result<(), GravityError> {
    for (name, value) in [
        ("k", params.k),
        ("n", params.n),
        ("min_distance", params.min_distance),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(GravityError::InvalidParameter { name, value });
        }
    }
    Ok(())
}

/// Evaluates the gravity formula for one pair.
///
/// Returns `None` when the adjusted distance is not strictly positive or
/// the result is not finite.
#[must_use]
pub fn gravity_volume(
    people_i: f64,
    people_j: f64,
    distance: f64,
    params: &GravityParams,
) -> Option<f64> {
    let adjusted = (distance + params.min_distance).powf(params.n);
    if adjusted.is_nan() || adjusted <= 0.0 {
        return None;
    }

    let volume = params.k * (people_i * people_j) / adjusted;
    volume.is_finite().then_some(volume)
}

/// Builds the estimator input for a snapshot, one point per observation.
#[must_use]
pub fn points_from_snapshot(snapshot: &[&Observation]) -> Vec<FlowPoint> {
    snapshot.iter().map(|obs| FlowPoint::from(*obs)).collect()
}

fn position(point: &FlowPoint) -> Point<f64> {
    Point::new(point.lng, point.lat)
}

/// Estimates volumes for predefined links, in link order.
///
/// Endpoints are resolved by [`FlowPoint::id`]; when several points share
/// an id the last one wins.
#[must_use]
pub fn link_volumes(
    points: &[FlowPoint],
    links: &[LinkDefinition],
    params: &GravityParams,
) -> Vec<CalculatedLinkVolume> {
    let by_id: HashMap<&str, &FlowPoint> = points.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut results = Vec::with_capacity(links.len());

    for link in links {
        let (Some(from), Some(to)) = (
            by_id.get(link.from_id.as_str()),
            by_id.get(link.to_id.as_str()),
        ) else {
            log::trace!(
                "Skipping link {} -> {}: endpoint not in snapshot",
                link.from_id,
                link.to_id
            );
            continue;
        };

        let d = haversine_distance(position(from), position(to));

        let Some(volume) = gravity_volume(from.people, to.people, d, params) else {
            log::debug!(
                "Skipping link {} -> {}: volume undefined at distance {d}",
                link.from_id,
                link.to_id
            );
            continue;
        };

        results.push(CalculatedLinkVolume {
            from_lat: from.lat,
            from_lng: from.lng,
            to_lat: to.lat,
            to_lng: to.lng,
            volume,
        });
    }

    results
}

/// Estimates volumes for every unordered pair `(i, j)` with `i < j`, in
/// that iteration order.
///
/// Cost is quadratic in the number of points.
#[must_use]
pub fn all_pair_volumes(points: &[FlowPoint], params: &GravityParams) -> Vec<PairVolume> {
    let mut results = Vec::with_capacity(points.len() * points.len().saturating_sub(1) / 2);

    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            let d = planar_distance(position(a), position(b));
            let value = gravity_volume(a.people, b.people, d, params);

            if value.is_none() {
                log::debug!("Volume undefined between {} and {}", a.id, b.id);
            }

            results.push(PairVolume {
                source: a.id.clone(),
                target: b.id.clone(),
                source_coords: [a.lng, a.lat],
                target_coords: [b.lng, b.lat],
                value,
            });
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, lat: f64, lng: f64, people: f64) -> FlowPoint {
        FlowPoint {
            id: id.to_string(),
            lat,
            lng,
            people,
        }
    }

    #[test]
    fn reproduces_reference_volume() {
        let params = GravityParams::link_defaults();
        let volume = gravity_volume(300.0, 400.0, 500.0, &params).unwrap();
        let expected = 100.0 * 120_000.0 / 600f64.sqrt();
        assert!((volume - expected).abs() < 1e-6, "{volume} vs {expected}");
        assert!((volume - 489_897.948).abs() < 1e-2);
    }

    #[test]
    fn link_mode_reproduces_reference_volume_over_great_circle_distance() {
        // 500 m due north along a meridian.
        let north = 38.26 + (500.0 / 6_371_000.0_f64).to_degrees();
        let points = vec![
            point("A", 38.26, 140.88, 300.0),
            point("B", north, 140.88, 400.0),
        ];

        let volumes = link_volumes(
            &points,
            &[LinkDefinition::new("A", "B")],
            &GravityParams::link_defaults(),
        );

        assert_eq!(volumes.len(), 1);
        let volume = volumes[0].volume;
        assert!((volume - 489_897.948).abs() < 0.05, "{volume}");
    }

    #[test]
    fn volume_is_symmetric() {
        let params = GravityParams::link_defaults();
        let a = gravity_volume(300.0, 400.0, 750.0, &params).unwrap();
        let b = gravity_volume(400.0, 300.0, 750.0, &params).unwrap();
        assert!((a - b).abs() < f64::EPSILON);
    }

    #[test]
    fn volume_strictly_decreases_with_distance() {
        let params = GravityParams::link_defaults();
        let mut previous = f64::INFINITY;
        for d in [0.0, 1.0, 10.0, 100.0, 1_000.0, 10_000.0] {
            let v = gravity_volume(300.0, 400.0, d, &params).unwrap();
            assert!(v < previous, "{v} at {d} not below {previous}");
            previous = v;
        }
    }

    #[test]
    fn floor_keeps_collocated_points_finite() {
        let v = gravity_volume(300.0, 400.0, 0.0, &GravityParams::link_defaults()).unwrap();
        assert!(v.is_finite());
    }

    #[test]
    fn zero_distance_without_floor_is_undefined() {
        let params = GravityParams::all_pairs_defaults();
        assert_eq!(gravity_volume(300.0, 400.0, 0.0, &params), None);
    }

    #[test]
    fn rejects_negative_and_non_finite_params() {
        assert!(validate_params(&GravityParams::link_defaults()).is_ok());
        assert!(validate_params(&GravityParams::all_pairs_defaults()).is_ok());

        let err = validate_params(&GravityParams {
            k: 1.0,
            n: f64::NAN,
            min_distance: 0.0,
        })
        .unwrap_err();
        assert!(matches!(err, GravityError::InvalidParameter { name: "n", .. }));

        assert!(
            validate_params(&GravityParams {
                k: 1.0,
                n: 1.0,
                min_distance: -5.0,
            })
            .is_err()
        );
    }

    #[test]
    fn link_mode_skips_missing_endpoints_and_keeps_link_order() {
        let points = vec![
            point("A", 38.2620, 140.8802, 300.0),
            point("B", 38.2630, 140.8780, 400.0),
            point("C", 38.2640, 140.8760, 200.0),
        ];
        let links = vec![
            LinkDefinition::new("B", "C"),
            LinkDefinition::new("A", "Z"),
            LinkDefinition::new("A", "B"),
        ];

        let volumes = link_volumes(&points, &links, &GravityParams::link_defaults());
        assert_eq!(volumes.len(), 2);
        assert!((volumes[0].from_lat - 38.2630).abs() < f64::EPSILON);
        assert!((volumes[1].to_lng - 140.8780).abs() < f64::EPSILON);
        assert!(volumes.iter().all(|v| v.volume.is_finite() && v.volume > 0.0));
    }

    #[test]
    fn link_mode_uses_last_point_for_duplicate_ids() {
        let points = vec![
            point("A", 38.0, 140.0, 1.0),
            point("B", 38.001, 140.0, 1.0),
            point("A", 38.002, 140.0, 1.0),
        ];
        let volumes = link_volumes(
            &points,
            &[LinkDefinition::new("A", "B")],
            &GravityParams::link_defaults(),
        );
        assert_eq!(volumes.len(), 1);
        assert!((volumes[0].from_lat - 38.002).abs() < f64::EPSILON);
    }

    #[test]
    fn link_mode_skips_undefined_volume() {
        let points = vec![point("A", 38.0, 140.0, 1.0), point("B", 38.0, 140.0, 1.0)];
        let params = GravityParams {
            k: 1.0,
            n: 1.0,
            min_distance: 0.0,
        };
        assert!(link_volumes(&points, &[LinkDefinition::new("A", "B")], &params).is_empty());
    }

    #[test]
    fn all_pairs_covers_each_unordered_pair_once() {
        let points = vec![
            point("A", 38.0, 140.0, 10.0),
            point("B", 38.1, 140.0, 20.0),
            point("C", 38.0, 140.1, 30.0),
            point("D", 38.1, 140.1, 40.0),
        ];
        let pairs = all_pair_volumes(&points, &GravityParams::all_pairs_defaults());
        let names: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.source.as_str(), p.target.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("A", "B"),
                ("A", "C"),
                ("A", "D"),
                ("B", "C"),
                ("B", "D"),
                ("C", "D"),
            ]
        );
        assert_eq!(pairs[0].source_coords, [140.0, 38.0]);
    }

    #[test]
    fn all_pairs_marks_collocated_pair_undefined() {
        let points = vec![
            point("A", 38.0, 140.0, 10.0),
            point("B", 38.0, 140.0, 20.0),
            point("C", 38.1, 140.0, 30.0),
        ];
        let pairs = all_pair_volumes(&points, &GravityParams::all_pairs_defaults());
        assert_eq!(pairs[0].value, None);
        assert!(pairs[1].value.is_some_and(f64::is_finite));
        assert!(pairs[2].value.is_some_and(f64::is_finite));
    }

    #[test]
    fn all_pairs_of_fewer_than_two_points_is_empty() {
        let params = GravityParams::all_pairs_defaults();
        assert!(all_pair_volumes(&[], &params).is_empty());
        assert!(all_pair_volumes(&[point("A", 38.0, 140.0, 1.0)], &params).is_empty());
    }

    #[test]
    fn snapshot_points_use_location_name_and_count() {
        let obs = Observation {
            timestamp: "2025-01-01T08:00:00+09:00".to_string(),
            people_count: 42.0,
            people_occupancy: 2.1,
            location_id: "s1".to_string(),
            location_name: "North".to_string(),
            latitude: 38.0,
            longitude: 140.0,
        };
        let points = points_from_snapshot(&[&obs]);
        assert_eq!(points, vec![point("North", 38.0, 140.0, 42.0)]);
    }
}
