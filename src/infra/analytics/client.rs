use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::warn;

use crate::services::analytics_api::{
    AnalyticsApi, PredictionRecord, RouteInfo, StoredPrediction, VolumeRow,
};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// HTTP client for the analytics backend.
///
/// The backend is a single endpoint dispatching on an `action` query
/// parameter (e.g. `?action=volume_by_route&service_no=118`). Every call is
/// bounded by the request/connect timeouts below plus a small fixed-backoff
/// retry, so callers degrade instead of hanging.
pub struct AnalyticsClient {
    base_url: String,
    client: reqwest::Client,
}

impl AnalyticsClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { base_url, client })
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<serde_json::Value> {
        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            let result = async {
                let response = self
                    .client
                    .get(&self.base_url)
                    .query(params)
                    .send()
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to send request: {}", e))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(anyhow::anyhow!("API returned status {}: {}", status, body));
                }

                response
                    .json::<serde_json::Value>()
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to parse response: {}", e))
            }
            .await;

            match result {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(attempt, max = MAX_ATTEMPTS, error = %e, "Backend request failed");
                    last_err = Some(e);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_BACKOFF).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("request failed")))
    }

    async fn post_json(
        &self,
        params: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            let result = async {
                let response = self
                    .client
                    .post(&self.base_url)
                    .query(params)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to send request: {}", e))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    return Err(anyhow::anyhow!("API returned status {}: {}", status, text));
                }

                response
                    .json::<serde_json::Value>()
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to parse response: {}", e))
            }
            .await;

            match result {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(attempt, max = MAX_ATTEMPTS, error = %e, "Backend request failed");
                    last_err = Some(e);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_BACKOFF).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("request failed")))
    }
}

#[async_trait]
impl AnalyticsApi for AnalyticsClient {
    async fn volume_by_route(
        &self,
        service_no: &str,
        month: Option<&str>,
    ) -> Result<Vec<VolumeRow>> {
        let mut params = vec![
            ("action", "volume_by_route"),
            ("service_no", service_no),
            ("direction", "1"),
        ];
        if let Some(month) = month {
            params.push(("month", month));
        }

        let json = self.get_json(&params).await?;
        Ok(serde_json::from_value(json)
            .map_err(|e| anyhow::anyhow!("Unexpected volume payload: {}", e))?)
    }

    async fn available_months(&self) -> Result<Vec<String>> {
        let json = self.get_json(&[("action", "available_months")]).await?;
        Ok(serde_json::from_value(json)
            .map_err(|e| anyhow::anyhow!("Unexpected months payload: {}", e))?)
    }

    async fn list_routes(&self) -> Result<Vec<RouteInfo>> {
        let json = self.get_json(&[("action", "routes")]).await?;
        Ok(serde_json::from_value(json)
            .map_err(|e| anyhow::anyhow!("Unexpected routes payload: {}", e))?)
    }

    async fn save_prediction(&self, record: &PredictionRecord) -> Result<Option<i64>> {
        let body = serde_json::to_value(record)?;
        let json = self
            .post_json(&[("action", "save_prediction")], &body)
            .await?;

        // The backend wraps the new row id as {"prediction_id": ...}.
        Ok(json["prediction_id"].as_i64())
    }

    async fn predictions_since(
        &self,
        route_id: &str,
        start: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<StoredPrediction>> {
        let start_str = start.to_rfc3339();
        let limit_str = limit.to_string();
        let params = [
            ("action", "get_predictions"),
            ("route_id", route_id),
            ("start_date", start_str.as_str()),
            ("limit", limit_str.as_str()),
        ];

        let json = self.get_json(&params).await?;
        Ok(serde_json::from_value(json)
            .map_err(|e| anyhow::anyhow!("Unexpected predictions payload: {}", e))?)
    }
}
