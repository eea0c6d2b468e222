//! Rule-based operational alerting over ridership forecasts.
//!
//! The classifier turns each forecasted point into zero, one, or two alerts
//! via an ordered predicate chain; the aggregator runs it across routes and
//! horizons, merges, sorts, and summarizes.

pub mod aggregate;
pub mod rules;
pub mod types;
