//! Alert data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Operational urgency of an alert, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    /// Sort rank: CRITICAL=0, WARNING=1, INFO=2.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }
}

/// The rule family that produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    HighDemand,
    UnusualPattern,
    PeakCapacity,
}

/// An operational signal derived from exactly one prediction.
///
/// Ephemeral: generated on demand from current predictions, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub route_id: String,
    pub timestamp: DateTime<Utc>,
    pub predicted_passengers: u32,
    pub severity: Severity,
    pub message: String,
    pub recommendation: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub confidence: f64,
}

/// Read-only rollup over a batch of alerts.
#[derive(Debug, Serialize)]
pub struct AlertSummary {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub routes_affected: usize,
    pub alert_types: HashMap<AlertType, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_rank_order() {
        assert!(Severity::Critical.rank() < Severity::Warning.rank());
        assert!(Severity::Warning.rank() < Severity::Info.rank());
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"CRITICAL\""
        );
        assert_eq!(serde_json::to_string(&Severity::Info).unwrap(), "\"INFO\"");
    }

    #[test]
    fn test_alert_type_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&AlertType::HighDemand).unwrap(),
            "\"HIGH_DEMAND\""
        );
        assert_eq!(
            serde_json::to_string(&AlertType::PeakCapacity).unwrap(),
            "\"PEAK_CAPACITY\""
        );
    }
}
