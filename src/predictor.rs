//! Single-point ridership prediction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::features::{FeatureVector, build_features};
use crate::model::RidershipModel;
use crate::services::analytics_api::{AnalyticsApi, PredictionRecord};

/// Hours treated as commuter rush on weekdays.
pub const PEAK_HOURS: [u32; 6] = [7, 8, 9, 17, 18, 19];

/// One model invocation's result. Immutable once returned.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub route_id: String,
    pub predicted_passengers: u32,
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
    pub is_peak: bool,
    pub features: FeatureVector,
}

/// Drives the model for one route/timestamp at a time.
///
/// Holds shared read-only references to the loaded model and the backend
/// handle; safe to reuse across sequential calls.
pub struct Predictor<'a, A: AnalyticsApi + ?Sized> {
    model: &'a RidershipModel,
    api: &'a A,
}

impl<'a, A: AnalyticsApi + ?Sized> Predictor<'a, A> {
    pub fn new(model: &'a RidershipModel, api: &'a A) -> Self {
        Self { model, api }
    }

    /// Predicts ridership for a route at a timestamp.
    ///
    /// Never fails: missing upstream data degrades through feature defaults,
    /// and a persistence failure (when `persist` is set) is logged and
    /// swallowed so the in-memory result is always returned.
    pub async fn predict(
        &self,
        route_id: &str,
        timestamp: DateTime<Utc>,
        persist: bool,
    ) -> Prediction {
        let features = build_features(self.api, route_id, timestamp).await;

        let raw = self.model.predict(&features.inputs());
        // No negative ridership; round to whole passengers.
        let predicted_passengers = raw.max(0.0).round() as u32;

        let prediction = Prediction {
            route_id: route_id.to_string(),
            predicted_passengers,
            timestamp,
            confidence: confidence(&features),
            is_peak: is_peak_hour(features.hour, features.is_weekend == 1),
            features,
        };

        debug!(
            route_id,
            predicted = prediction.predicted_passengers,
            confidence = prediction.confidence,
            is_peak = prediction.is_peak,
            "Prediction computed"
        );

        if persist {
            let record = PredictionRecord {
                route_id: prediction.route_id.clone(),
                prediction_datetime: prediction.timestamp,
                predicted_passengers: prediction.predicted_passengers,
                confidence: prediction.confidence,
                is_peak: prediction.is_peak,
                model_version: self.model.version().to_string(),
            };
            if let Err(e) = self.api.save_prediction(&record).await {
                warn!(route_id, error = %e, "Could not persist prediction");
            }
        }

        prediction
    }
}

/// Confidence heuristic: lower trust for sparse-data regimes (weekends, late
/// night) without model-level uncertainty estimates. Always in [0.70, 0.95].
pub fn confidence(features: &FeatureVector) -> f64 {
    let mut c: f64 = 0.85;
    if features.is_weekend == 1 {
        c -= 0.07;
    }
    if features.hour < 6 || features.hour > 22 {
        c -= 0.05;
    }
    c.clamp(0.70, 0.95)
}

/// Fixed calendar rule: morning/evening rush on weekdays only, independent of
/// predicted volume.
pub fn is_peak_hour(hour: u32, is_weekend: bool) -> bool {
    PEAK_HOURS.contains(&hour) && !is_weekend
}
