//! Deterministic sample dataset used when no file has been loaded.
//!
//! Two Sendai arcade sensors observed hourly over two days, matching the
//! shape of the real sensor export.

use crowd_flow_observation_models::Observation;

/// Dates covered by the sample dataset.
pub const SAMPLE_DATES: [&str; 2] = ["2025-01-01", "2025-01-02"];

/// UTC offset appended to every sample timestamp.
pub const SAMPLE_OFFSET: &str = "+09:00";

/// A sensor location in the sample dataset.
#[derive(Debug, Clone, Copy)]
pub struct SampleArea {
    /// Sensor identifier.
    pub id: &'static str,
    /// Location display name.
    pub name: &'static str,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Locations covered by the sample dataset.
pub const SAMPLE_AREAS: [SampleArea; 2] = [
    SampleArea {
        id: "jp.sendai.sample.1",
        name: "ハピナ名掛丁商店街",
        lat: 38.261_976,
        lng: 140.880_226,
    },
    SampleArea {
        id: "jp.sendai.sample.2",
        name: "勾当台公園歴史のゾーン・北",
        lat: 38.268_649,
        lng: 140.870_504,
    },
];

const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_033_988_749_895;

/// Builds the sample dataset: every date × area × hour, in that nesting
/// order (96 observations).
#[must_use]
pub fn generate() -> Vec<Observation> {
    let mut data = Vec::with_capacity(SAMPLE_DATES.len() * SAMPLE_AREAS.len() * 24);
    let mut seq: u32 = 0;

    for date in SAMPLE_DATES {
        for area in &SAMPLE_AREAS {
            for hour in 0..24 {
                seq += 1;
                // Golden-ratio sequence spreads counts over [100, 600).
                let fraction = (f64::from(seq) * GOLDEN_RATIO_CONJUGATE).fract();
                let count = round_to(fraction.mul_add(500.0, 100.0), 2);

                data.push(Observation {
                    timestamp: format!("{date}T{hour:02}:00:00{SAMPLE_OFFSET}"),
                    people_count: count,
                    people_occupancy: round_to(count / 20.0, 4),
                    location_id: area.id.to_string(),
                    location_name: area.name.to_string(),
                    latitude: area.lat,
                    longitude: area.lng,
                });
            }
        }
    }

    data
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn covers_every_date_area_and_hour() {
        let data = generate();
        assert_eq!(data.len(), 96);

        let keys: BTreeSet<(&str, &str)> = data
            .iter()
            .map(|o| (o.timestamp.as_str(), o.location_name.as_str()))
            .collect();
        assert_eq!(keys.len(), 96);
    }

    #[test]
    fn timestamps_carry_the_sample_offset() {
        let data = generate();
        assert_eq!(data[0].timestamp, "2025-01-01T00:00:00+09:00");
        assert_eq!(data[95].timestamp, "2025-01-02T23:00:00+09:00");
    }

    #[test]
    fn counts_stay_in_range_and_occupancy_tracks_count() {
        for obs in generate() {
            assert!((100.0..=600.0).contains(&obs.people_count), "{obs:?}");
            assert!((obs.people_occupancy - obs.people_count / 20.0).abs() < 1e-4);
        }
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(generate(), generate());
    }
}
