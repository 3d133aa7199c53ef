//! Distance functions used by the two estimation modes.
//!
//! Points follow the `geo` convention: `x` is longitude, `y` is latitude.

use geo::Point;

/// Earth radius used for great-circle distances, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two lon/lat points.
#[must_use]
pub fn haversine_distance(from: Point<f64>, to: Point<f64>) -> f64 {
    let lat1 = from.y().to_radians();
    let lat2 = to.y().to_radians();
    let d_lat = (to.y() - from.y()).to_radians();
    let d_lng = (to.x() - from.x()).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Euclidean distance over raw degree deltas. Only meaningful as a
/// relative measure within a small area.
#[must_use]
pub fn planar_distance(from: Point<f64>, to: Point<f64>) -> f64 {
    let delta = from - to;
    delta.x().hypot(delta.y())
}
