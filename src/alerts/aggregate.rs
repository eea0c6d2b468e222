//! Alert aggregation across routes and forecast horizons.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::alerts::rules::{Thresholds, classify};
use crate::alerts::types::{Alert, AlertSummary, Severity};
use crate::forecast::predict_next_hours;
use crate::predictor::{Prediction, Predictor};
use crate::services::analytics_api::AnalyticsApi;

/// Supplies hourly forecasts to the aggregator.
///
/// [`Predictor`] is the production implementation; tests inject fakes so the
/// skip-on-failure contract is exercisable without a backend.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn hourly_forecast(&self, route_id: &str, hours: u32) -> Result<Vec<Prediction>>;
}

#[async_trait]
impl<A: AnalyticsApi + ?Sized> ForecastSource for Predictor<'_, A> {
    async fn hourly_forecast(&self, route_id: &str, hours: u32) -> Result<Vec<Prediction>> {
        Ok(predict_next_hours(self, route_id, chrono::Utc::now(), hours, false).await)
    }
}

/// Runs the classifier over one route's forecast window.
pub async fn alerts_for_route<S: ForecastSource + ?Sized>(
    source: &S,
    route_id: &str,
    hours: u32,
    thresholds: &Thresholds,
) -> Result<Vec<Alert>> {
    let predictions = source.hourly_forecast(route_id, hours).await?;

    let mut alerts = Vec::new();
    for prediction in &predictions {
        alerts.extend(classify(prediction, thresholds));
    }

    Ok(alerts)
}

/// Runs the classifier over every given route and merges the results.
///
/// A route whose forecast fails is logged and skipped; the sweep continues
/// over the remaining routes. Output is sorted by severity, then time.
pub async fn alerts_for_routes<S: ForecastSource + ?Sized>(
    source: &S,
    routes: &[String],
    hours: u32,
    thresholds: &Thresholds,
) -> Vec<Alert> {
    let mut all_alerts = Vec::new();

    for route_id in routes {
        match alerts_for_route(source, route_id, hours, thresholds).await {
            Ok(alerts) => {
                info!(route_id, count = alerts.len(), "Route alerts generated");
                all_alerts.extend(alerts);
            }
            Err(e) => {
                warn!(route_id, error = %e, "Could not generate alerts for route, skipping");
            }
        }
    }

    sort_alerts(&mut all_alerts);
    all_alerts
}

/// Sorts by (severity rank, timestamp) ascending: most urgent first, earliest
/// first within a severity.
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then(a.timestamp.cmp(&b.timestamp))
    });
}

/// Rolls a batch of alerts up into counts by severity, type, and route.
pub fn summarize(alerts: &[Alert]) -> AlertSummary {
    let mut alert_types = HashMap::new();
    let mut routes = std::collections::HashSet::new();
    let mut critical = 0;
    let mut warning = 0;
    let mut info = 0;

    for alert in alerts {
        match alert.severity {
            Severity::Critical => critical += 1,
            Severity::Warning => warning += 1,
            Severity::Info => info += 1,
        }
        *alert_types.entry(alert.alert_type).or_insert(0) += 1;
        routes.insert(alert.route_id.as_str());
    }

    AlertSummary {
        total: alerts.len(),
        critical,
        warning,
        info,
        routes_affected: routes.len(),
        alert_types,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::types::AlertType;
    use crate::features::FeatureVector;
    use chrono::{TimeZone, Utc};

    /// Emits a fixed passenger count per hour for every route except the ones
    /// it is configured to fail on.
    struct FakeSource {
        passengers_by_hour: Vec<u32>,
        failing_routes: Vec<String>,
    }

    #[async_trait]
    impl ForecastSource for FakeSource {
        async fn hourly_forecast(&self, route_id: &str, hours: u32) -> Result<Vec<Prediction>> {
            if self.failing_routes.iter().any(|r| r == route_id) {
                return Err(anyhow::anyhow!("forecast unavailable for {}", route_id));
            }

            let mut predictions = Vec::new();
            for i in 0..hours {
                let hour = i % 24;
                let passengers = self.passengers_by_hour[hour as usize % self.passengers_by_hour.len()];
                // Friday 2025-11-28 as the weekday base.
                let timestamp = Utc.with_ymd_and_hms(2025, 11, 28, hour, 0, 0).unwrap();
                predictions.push(Prediction {
                    route_id: route_id.to_string(),
                    predicted_passengers: passengers,
                    timestamp,
                    confidence: 0.85,
                    is_peak: crate::predictor::is_peak_hour(hour, false),
                    features: FeatureVector {
                        hour,
                        day_of_week: 4,
                        is_weekend: 0,
                        month: 11,
                        prev_hour_passengers: 100.0,
                    },
                });
            }
            Ok(predictions)
        }
    }

    fn routes(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_single_route_critical_hour() {
        let source = FakeSource {
            passengers_by_hour: vec![280],
            failing_routes: Vec::new(),
        };

        let alerts = alerts_for_route(&source, "118", 1, &Thresholds::default())
            .await
            .unwrap();

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].alert_type, AlertType::HighDemand);
    }

    #[tokio::test]
    async fn test_failing_route_skipped() {
        let source = FakeSource {
            passengers_by_hour: vec![280],
            failing_routes: vec!["101".to_string()],
        };

        let alerts = alerts_for_routes(
            &source,
            &routes(&["118", "101", "106"]),
            1,
            &Thresholds::default(),
        )
        .await;
        let summary = summarize(&alerts);

        // Only the two healthy routes contribute.
        assert_eq!(summary.total, 2);
        assert_eq!(summary.routes_affected, 2);
        assert_eq!(summary.critical, 2);
    }

    #[tokio::test]
    async fn test_sorted_by_severity_then_time() {
        // Hour 0 at 120 -> late-night INFO; hour 8 at 190 -> WARNING;
        // hour 12 at 280 -> CRITICAL; everything else quiet.
        let mut by_hour = vec![0u32; 24];
        by_hour[0] = 120;
        by_hour[8] = 190;
        by_hour[12] = 280;
        let source = FakeSource {
            passengers_by_hour: by_hour,
            failing_routes: Vec::new(),
        };

        let alerts =
            alerts_for_routes(&source, &routes(&["118"]), 24, &Thresholds::default()).await;

        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[1].severity, Severity::Warning);
        assert_eq!(alerts[2].severity, Severity::Info);
    }

    #[tokio::test]
    async fn test_summary_counts_by_type() {
        let mut by_hour = vec![0u32; 24];
        by_hour[23] = 120; // UNUSUAL_PATTERN
        by_hour[8] = 160; // PEAK_CAPACITY
        by_hour[12] = 280; // HIGH_DEMAND
        let source = FakeSource {
            passengers_by_hour: by_hour,
            failing_routes: Vec::new(),
        };

        let alerts =
            alerts_for_routes(&source, &routes(&["118"]), 24, &Thresholds::default()).await;
        let summary = summarize(&alerts);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.alert_types[&AlertType::HighDemand], 1);
        assert_eq!(summary.alert_types[&AlertType::UnusualPattern], 1);
        assert_eq!(summary.alert_types[&AlertType::PeakCapacity], 1);
    }

    #[tokio::test]
    async fn test_all_routes_failing_yields_empty_batch() {
        let source = FakeSource {
            passengers_by_hour: vec![280],
            failing_routes: vec!["118".to_string(), "101".to_string()],
        };

        let alerts =
            alerts_for_routes(&source, &routes(&["118", "101"]), 1, &Thresholds::default()).await;

        assert!(alerts.is_empty());
        assert_eq!(summarize(&alerts).total, 0);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.routes_affected, 0);
        assert!(summary.alert_types.is_empty());
    }
}
