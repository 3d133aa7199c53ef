#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Observation normalizer for crowd-count datasets.
//!
//! Turns raw delimited text (or pre-split rows) into a validated list of
//! [`Observation`]s. Row-level defects never surface as errors: rows with
//! too few columns or unusable coordinates are dropped, and unparsable
//! counts become `0`. The only failures reported are I/O failures at the
//! file boundary.

pub mod parsing;
pub mod synthetic;

use std::io::Write;
use std::path::{Path, PathBuf};

use crowd_flow_observation_models::Observation;

use crate::parsing::{parse_coordinate, parse_count, split_csv_line};

/// Environment variable naming a CSV file to load at startup.
pub const DATA_ENV_VAR: &str = "CROWD_FLOW_DATA";

/// Column names in the fixed positional order every row must follow.
pub const COLUMNS: [&str; 7] = [
    "dateObservedFrom",
    "peopleCount",
    "peopleOccupancy",
    "identification",
    "locationName",
    "latitude",
    "longitude",
];

/// Errors that can occur while reading or writing datasets.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialized output was not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Converts one positional row into an [`Observation`].
///
/// Returns `None` when the row has fewer than 7 fields or when latitude or
/// longitude is not a finite number. Extra trailing fields are ignored.
#[must_use]
pub fn normalize_row<S: AsRef<str>>(fields: &[S]) -> Option<Observation> {
    if fields.len() < COLUMNS.len() {
        return None;
    }

    let field = |i: usize| fields[i].as_ref();

    let latitude = parse_coordinate(field(5))?;
    let longitude = parse_coordinate(field(6))?;

    Some(Observation {
        timestamp: field(0).to_string(),
        people_count: parse_count(field(1)),
        people_occupancy: parse_count(field(2)),
        location_id: field(3).to_string(),
        location_name: field(4).to_string(),
        latitude,
        longitude,
    })
}

/// Normalizes pre-split rows, preserving input order. No header is
/// expected.
pub fn normalize_rows<I, R, S>(rows: I) -> Vec<Observation>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    rows.into_iter()
        .filter_map(|row| normalize_row(row.as_ref()))
        .collect()
}

/// Normalizes raw CSV text.
///
/// Blank lines are ignored and the first remaining line is treated as a
/// header. Input with fewer than two non-blank lines yields an empty
/// dataset.
#[must_use]
pub fn normalize_text(text: &str) -> Vec<Observation> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        log::debug!("Input has no data rows ({} non-blank lines)", lines.len());
        return Vec::new();
    }

    let rows = &lines[1..];
    let dataset = normalize_rows(rows.iter().map(|line| split_csv_line(line)));

    let dropped = rows.len() - dataset.len();
    if dropped > 0 {
        log::debug!(
            "Normalized {} of {} rows ({dropped} dropped)",
            dataset.len(),
            rows.len()
        );
    }

    dataset
}

/// Reads and normalizes a CSV file.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be read.
pub fn read_dataset(path: &Path) -> Result<Vec<Observation>, IngestError> {
    let text = std::fs::read_to_string(path)?;
    let dataset = normalize_text(&text);
    log::info!(
        "Loaded {} observations from {}",
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

/// Loads the dataset from `path`, else from the file named by
/// [`DATA_ENV_VAR`], else the built-in sample dataset.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the chosen file cannot be read.
pub fn load_dataset(path: Option<&Path>) -> Result<Vec<Observation>, IngestError> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(DATA_ENV_VAR).map(PathBuf::from));

    match path {
        Some(path) => read_dataset(&path),
        None => {
            log::info!("No dataset given, using sample data");
            Ok(synthetic::generate())
        }
    }
}

/// Writes a dataset as CSV (header plus one row per observation) in the
/// column order [`normalize_text`] expects.
///
/// # Errors
///
/// Returns [`IngestError`] if writing to `writer` fails.
pub fn write_csv<W: Write>(writer: W, dataset: &[Observation]) -> Result<(), IngestError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(COLUMNS)?;

    for obs in dataset {
        let count = obs.people_count.to_string();
        let occupancy = obs.people_occupancy.to_string();
        let latitude = obs.latitude.to_string();
        let longitude = obs.longitude.to_string();
        wtr.write_record([
            obs.timestamp.as_str(),
            count.as_str(),
            occupancy.as_str(),
            obs.location_id.as_str(),
            obs.location_name.as_str(),
            latitude.as_str(),
            longitude.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Serializes a dataset to a CSV string.
///
/// # Errors
///
/// Returns [`IngestError`] if serialization fails.
pub fn to_csv_string(dataset: &[Observation]) -> Result<String, IngestError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, dataset)?;
    Ok(String::from_utf8(buf)?)
}
