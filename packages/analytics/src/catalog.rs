//! Location catalog built from a (typically date-filtered) set of rows.

use std::collections::BTreeSet;

use crowd_flow_observation_models::{LocationEntry, Observation};

/// Returns one entry per distinct location name, in first-seen order.
///
/// The coordinates of the first row for a name are kept even if later rows
/// for the same name report different ones.
#[must_use]
pub fn unique_locations(rows: &[&Observation]) -> Vec<LocationEntry> {
    let mut seen = BTreeSet::new();
    let mut locations = Vec::new();

    for obs in rows {
        if seen.insert(obs.location_name.as_str()) {
            locations.push(LocationEntry {
                name: obs.location_name.clone(),
                lat: obs.latitude,
                lng: obs.longitude,
            });
        }
    }

    locations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(name: &str, lat: f64) -> Observation {
        Observation {
            timestamp: "2025-01-01T08:00:00+09:00".to_string(),
            people_count: 1.0,
            people_occupancy: 0.05,
            location_id: format!("id-{name}"),
            location_name: name.to_string(),
            latitude: lat,
            longitude: 140.88,
        }
    }

    #[test]
    fn keeps_first_seen_order_and_coordinates() {
        let data = [
            obs("Zeta", 38.1),
            obs("Alpha", 38.2),
            obs("Zeta", 99.0),
            obs("Mid", 38.3),
        ];
        let rows: Vec<&Observation> = data.iter().collect();
        let locations = unique_locations(&rows);

        let names: Vec<&str> = locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
        assert!((locations[0].lat - 38.1).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_input_yields_empty_catalog() {
        assert!(unique_locations(&[]).is_empty());
    }
}
