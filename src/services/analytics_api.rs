//! Trait and wire types for the ridership analytics backend.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One aggregated hourly volume row for a route.
///
/// Returned by the backend's `volume_by_route` action; `total_passengers`
/// is the summed tap-in count for that route/hour across the queried window.
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeRow {
    pub hour: u32,
    pub total_passengers: f64,
    #[serde(default)]
    pub day: Option<u32>,
}

/// Route catalog entry from the backend's `routes` action.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteInfo {
    pub service_no: String,
    #[serde(default)]
    pub direction: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Prediction record as persisted by the backend (`save_prediction`).
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub route_id: String,
    pub prediction_datetime: DateTime<Utc>,
    pub predicted_passengers: u32,
    pub confidence: f64,
    pub is_peak: bool,
    pub model_version: String,
}

/// Previously persisted prediction as returned by `get_predictions`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoredPrediction {
    #[serde(default)]
    pub id: Option<i64>,
    pub route_id: String,
    pub prediction_datetime: DateTime<Utc>,
    pub predicted_passengers: u32,
    pub confidence: f64,
    pub is_peak: bool,
    #[serde(default)]
    pub model_version: Option<String>,
}

/// Abstraction over the analytics backend API.
///
/// The production implementation talks HTTP/JSON to the PHP backend
/// ([`crate::infra::analytics::client::AnalyticsClient`]); tests substitute
/// in-memory fakes.
#[async_trait::async_trait]
pub trait AnalyticsApi: Send + Sync {
    /// Aggregated hourly volume for a route. `month` is `YYYYMM`; `None`
    /// queries across all retained months.
    async fn volume_by_route(&self, service_no: &str, month: Option<&str>)
    -> Result<Vec<VolumeRow>>;

    /// All months with volume data, in `YYYYMM` format.
    async fn available_months(&self) -> Result<Vec<String>>;

    /// Route catalog listing.
    async fn list_routes(&self) -> Result<Vec<RouteInfo>>;

    /// Persists a prediction, returning the stored record id if the backend
    /// reports one.
    async fn save_prediction(&self, record: &PredictionRecord) -> Result<Option<i64>>;

    /// Persisted predictions for a route from `start` onward, newest first,
    /// capped at `limit` rows.
    async fn predictions_since(
        &self,
        route_id: &str,
        start: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<StoredPrediction>>;
}
