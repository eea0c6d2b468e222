pub mod alerts;
pub mod config;
pub mod features;
pub mod forecast;
pub mod infra;
pub mod model;
pub mod output;
pub mod predictor;
pub mod services;
