//! Output formatting and persistence for predictions.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::predictor::Prediction;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a record using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(record: &T) {
    debug!("{:#?}", record);
}

/// Serializes any result record as pretty-printed JSON for the caller.
pub fn to_json<T: Serialize>(record: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Flattened prediction row for CSV output (the csv crate does not handle
/// nested structs).
#[derive(Serialize)]
struct PredictionRow<'a> {
    timestamp: DateTime<Utc>,
    route_id: &'a str,
    predicted_passengers: u32,
    confidence: f64,
    is_peak: bool,
    hour: u32,
    day_of_week: u32,
    is_weekend: u8,
    month: u32,
    prev_hour_passengers: f64,
}

impl<'a> From<&'a Prediction> for PredictionRow<'a> {
    fn from(p: &'a Prediction) -> Self {
        Self {
            timestamp: p.timestamp,
            route_id: &p.route_id,
            predicted_passengers: p.predicted_passengers,
            confidence: p.confidence,
            is_peak: p.is_peak,
            hour: p.features.hour,
            day_of_week: p.features.day_of_week,
            is_weekend: p.features.is_weekend,
            month: p.features.month,
            prev_hour_passengers: p.features.prev_hour_passengers,
        }
    }
}

/// Appends a [`Prediction`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, prediction: &Prediction) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(PredictionRow::from(prediction))?;
    writer.flush()?;

    Ok(())
}
