//! Compiled thresholds and environment-based configuration.
//!
//! Alert thresholds and the fallback route list mirror the operational
//! defaults used when the backend catalog is unreachable.

/// Maximum typical passenger count a single bus can carry.
pub const CAPACITY_PER_BUS: u32 = 180;

/// Elevated-demand threshold for the lowest high-demand tier.
pub const HIGH_DEMAND_THRESHOLD: u32 = 200;

/// Severe overcrowding threshold (1.5x capacity).
pub const CRITICAL_THRESHOLD: u32 = 270;

/// Last-resort lag-feature value when no historical data exists for a route.
pub const DEFAULT_PREV_HOUR_PASSENGERS: f64 = 100.0;

/// Routes used for the all-routes alert sweep when the backend route
/// catalog cannot be fetched.
pub const DEFAULT_ROUTES: [&str; 10] = [
    "10", "100", "100A", "101", "102", "105", "105B", "106", "106A", "118",
];

/// Base URL of the analytics backend API.
///
/// Read from `ANALYTICS_API_URL`, defaulting to a local PHP dev server.
pub fn api_base_url() -> String {
    std::env::var("ANALYTICS_API_URL")
        .unwrap_or_else(|_| "http://localhost:8000/analytics_api.php".to_string())
}

/// Path to the trained model artifact, from `MODEL_FILE`.
pub fn model_file() -> String {
    std::env::var("MODEL_FILE").unwrap_or_else(|_| "models/ridership_model.json".to_string())
}
