//! Feature construction for the ridership model.
//!
//! A prediction input is a fixed, ordered vector of five features derived
//! from the target timestamp plus one lag feature: the historical average
//! ridership for the route at that hour.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::DEFAULT_PREV_HOUR_PASSENGERS;
use crate::services::analytics_api::AnalyticsApi;

/// Model input feature names, in the order the artifact expects them.
pub const FEATURE_NAMES: [&str; 5] = [
    "hour",
    "day_of_week",
    "is_weekend",
    "month",
    "prev_hour_passengers",
];

/// The fixed feature vector handed to the model.
///
/// Invariants: `hour` in 0–23, `day_of_week` 0=Monday..6=Sunday, `is_weekend`
/// is 1 iff `day_of_week` is 5 or 6, `month` in 1–12, and
/// `prev_hour_passengers` is finite and non-negative. Calendar fields are
/// derived from `chrono` accessors and hold by construction; the lag feature
/// is sanitized in [`FeatureVector::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub hour: u32,
    pub day_of_week: u32,
    pub is_weekend: u8,
    pub month: u32,
    pub prev_hour_passengers: f64,
}

impl FeatureVector {
    /// Builds the vector from a timestamp's calendar fields and a lag value.
    ///
    /// A non-finite or negative lag value is replaced with the documented
    /// default so the model never sees an undefined input.
    pub fn new(timestamp: DateTime<Utc>, prev_hour_passengers: f64) -> Self {
        let day_of_week = timestamp.weekday().num_days_from_monday();
        let prev = if prev_hour_passengers.is_finite() && prev_hour_passengers >= 0.0 {
            prev_hour_passengers
        } else {
            warn!(
                value = prev_hour_passengers,
                "Undefined lag feature, using default"
            );
            DEFAULT_PREV_HOUR_PASSENGERS
        };

        Self {
            hour: timestamp.hour(),
            day_of_week,
            is_weekend: if day_of_week >= 5 { 1 } else { 0 },
            month: timestamp.month(),
            prev_hour_passengers: prev,
        }
    }

    /// The ordered input vector, matching [`FEATURE_NAMES`].
    pub fn inputs(&self) -> [f64; 5] {
        [
            self.hour as f64,
            self.day_of_week as f64,
            self.is_weekend as f64,
            self.month as f64,
            self.prev_hour_passengers,
        ]
    }
}

/// Mean historical ridership for a route at a given hour of day.
///
/// Falls back from the hour-specific mean to the route's overall mean to
/// [`DEFAULT_PREV_HOUR_PASSENGERS`]; backend failures degrade to the default
/// with a warning. Never errors.
pub async fn historical_average<A: AnalyticsApi + ?Sized>(
    api: &A,
    route_id: &str,
    hour: u32,
) -> f64 {
    let rows = match api.volume_by_route(route_id, None).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(route_id, error = %e, "Could not fetch historical volume, using default");
            return DEFAULT_PREV_HOUR_PASSENGERS;
        }
    };

    if rows.is_empty() {
        return DEFAULT_PREV_HOUR_PASSENGERS;
    }

    let hour_values: Vec<f64> = rows
        .iter()
        .filter(|r| r.hour == hour)
        .map(|r| r.total_passengers)
        .collect();

    if !hour_values.is_empty() {
        return mean(&hour_values);
    }

    let all_values: Vec<f64> = rows.iter().map(|r| r.total_passengers).collect();
    mean(&all_values)
}

/// Constructs the full feature vector for a route and target timestamp.
pub async fn build_features<A: AnalyticsApi + ?Sized>(
    api: &A,
    route_id: &str,
    timestamp: DateTime<Utc>,
) -> FeatureVector {
    let prev = historical_average(api, route_id, timestamp.hour()).await;
    FeatureVector::new(timestamp, prev)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
