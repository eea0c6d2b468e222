//! Multi-hour and daily forecast composition.
//!
//! All per-point work is delegated to the [`Predictor`]; this module only
//! owns the iteration and aggregation contract.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::predictor::{Prediction, Predictor};
use crate::services::analytics_api::AnalyticsApi;

/// 24 hourly predictions for one route and calendar date, with the daily
/// total and the (first-of-ties) peak hour.
#[derive(Debug, Clone, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub route_id: String,
    pub hourly_predictions: Vec<Prediction>,
    pub daily_total: u64,
    pub peak_hour: u32,
    pub peak_passengers: u32,
}

/// Predicts the next `hours` hours for a route at hourly increments starting
/// from `start`, in order.
pub async fn predict_next_hours<A: AnalyticsApi + ?Sized>(
    predictor: &Predictor<'_, A>,
    route_id: &str,
    start: DateTime<Utc>,
    hours: u32,
    persist: bool,
) -> Vec<Prediction> {
    let mut predictions = Vec::with_capacity(hours as usize);

    for i in 0..hours {
        let target = start + Duration::hours(i as i64);
        predictions.push(predictor.predict(route_id, target, persist).await);
    }

    predictions
}

/// Predicts all 24 hours of a calendar date and derives daily aggregates.
///
/// The hourly sequence is always exactly 24 entries in ascending hour order;
/// a tie for the maximum resolves to the earliest hour.
pub async fn daily_forecast<A: AnalyticsApi + ?Sized>(
    predictor: &Predictor<'_, A>,
    route_id: &str,
    date: NaiveDate,
    persist: bool,
) -> DailyForecast {
    let mut hourly = Vec::with_capacity(24);

    for hour in 0..24 {
        let target = date
            .and_hms_opt(hour, 0, 0)
            .expect("hour in 0..24 is a valid time")
            .and_utc();
        hourly.push(predictor.predict(route_id, target, persist).await);
    }

    let daily_total: u64 = hourly.iter().map(|p| p.predicted_passengers as u64).sum();

    // Stable max over ascending hour order: strictly-greater keeps the first
    // of any tie.
    let mut peak_hour = 0;
    let mut peak_passengers = 0;
    for p in &hourly {
        if p.predicted_passengers > peak_passengers {
            peak_passengers = p.predicted_passengers;
            peak_hour = p.features.hour;
        }
    }

    DailyForecast {
        date,
        route_id: route_id.to_string(),
        hourly_predictions: hourly,
        daily_total,
        peak_hour,
        peak_passengers,
    }
}
