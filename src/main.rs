//! CLI entry point for the ridership forecast tool.
//!
//! Provides subcommands for single-point predictions, multi-hour and daily
//! forecasts, capacity alert generation, and stored-prediction lookups.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use ridership_forecast::{
    alerts::{
        aggregate::{alerts_for_route, alerts_for_routes, sort_alerts, summarize},
        rules::Thresholds,
    },
    config,
    forecast::{daily_forecast, predict_next_hours},
    infra::analytics::client::AnalyticsClient,
    model::load_model,
    output::{append_record, to_json},
    predictor::Predictor,
    services::analytics_api::AnalyticsApi,
};
use serde_json::json;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ridership_forecast")]
#[command(about = "Predict transit ridership and raise capacity alerts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict ridership for one route at one point in time
    Predict {
        /// Route service number (e.g. "118")
        route: String,

        /// Target time (RFC 3339 or "YYYY-MM-DDTHH:MM"), default now
        #[arg(short, long)]
        time: Option<String>,

        /// Persist the prediction to the analytics backend
        #[arg(long, default_value_t = false)]
        save: bool,

        /// Optional CSV file to append the prediction to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Predict the next N hours for a route
    Forecast {
        /// Route service number
        route: String,

        /// Number of hours ahead (1-48)
        #[arg(short = 'n', long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(1..=48))]
        hours: u32,

        /// Persist each prediction to the analytics backend
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Predict all 24 hours of a calendar date for a route
    Daily {
        /// Route service number
        route: String,

        /// Date (YYYY-MM-DD), default today
        #[arg(short, long)]
        date: Option<String>,

        /// Persist each prediction to the analytics backend
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Generate capacity alerts for one route or all routes
    Alerts {
        /// Route service number; omit to sweep all known routes
        #[arg(short, long)]
        route: Option<String>,

        /// Forecast window in hours (1-48)
        #[arg(short = 'n', long, default_value_t = 24, value_parser = clap::value_parser!(u32).range(1..=48))]
        hours: u32,
    },
    /// Show predictions previously persisted to the backend
    Recent {
        /// Route service number
        route: String,

        /// How many hours back to look
        #[arg(short = 'n', long, default_value_t = 24)]
        hours: u32,

        /// Maximum number of rows
        #[arg(short, long, default_value_t = 100)]
        limit: u32,
    },
    /// List months with historical volume data
    Months,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/ridership_forecast.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ridership_forecast.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let api = AnalyticsClient::new(config::api_base_url())?;

    match cli.command {
        Commands::Predict {
            route,
            time,
            save,
            output,
        } => {
            let model = load_model()?;
            let predictor = Predictor::new(&model, &api);

            let timestamp = match time {
                Some(t) => parse_time(&t)?,
                None => Utc::now(),
            };

            let prediction = predictor.predict(&route, timestamp, save).await;
            info!(
                route_id = %route,
                predicted = prediction.predicted_passengers,
                is_peak = prediction.is_peak,
                "Prediction complete"
            );

            if let Some(path) = output {
                append_record(&path, &prediction)?;
            }
            println!("{}", to_json(&prediction)?);
        }
        Commands::Forecast { route, hours, save } => {
            let model = load_model()?;
            let predictor = Predictor::new(&model, &api);

            let predictions = predict_next_hours(&predictor, &route, Utc::now(), hours, save).await;
            info!(route_id = %route, hours, "Forecast complete");

            println!("{}", to_json(&predictions)?);
        }
        Commands::Daily { route, date, save } => {
            let model = load_model()?;
            let predictor = Predictor::new(&model, &api);

            let date = match date {
                Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .map_err(|e| anyhow::anyhow!("Invalid date {:?}: {}", d, e))?,
                None => Utc::now().date_naive(),
            };

            let forecast = daily_forecast(&predictor, &route, date, save).await;
            info!(
                route_id = %route,
                date = %date,
                daily_total = forecast.daily_total,
                peak_hour = forecast.peak_hour,
                "Daily forecast complete"
            );

            println!("{}", to_json(&forecast)?);
        }
        Commands::Alerts { route, hours } => {
            let model = load_model()?;
            let predictor = Predictor::new(&model, &api);
            let thresholds = Thresholds::default();

            let alerts = match route {
                Some(route) => {
                    let mut alerts =
                        alerts_for_route(&predictor, &route, hours, &thresholds).await?;
                    sort_alerts(&mut alerts);
                    alerts
                }
                None => {
                    let routes = route_catalog(&api).await;
                    alerts_for_routes(&predictor, &routes, hours, &thresholds).await
                }
            };

            let summary = summarize(&alerts);
            info!(
                total = summary.total,
                critical = summary.critical,
                warning = summary.warning,
                routes_affected = summary.routes_affected,
                "Alert sweep complete"
            );

            println!(
                "{}",
                to_json(&json!({ "alerts": alerts, "summary": summary }))?
            );
        }
        Commands::Recent {
            route,
            hours,
            limit,
        } => {
            let start = Utc::now() - Duration::hours(hours as i64);
            let predictions = api.predictions_since(&route, start, limit).await?;
            info!(route_id = %route, count = predictions.len(), "Stored predictions fetched");

            println!("{}", to_json(&predictions)?);
        }
        Commands::Months => {
            let months = api.available_months().await?;
            info!(count = months.len(), "Available months fetched");

            println!("{}", to_json(&months)?);
        }
    }

    Ok(())
}

/// Parses an RFC 3339 timestamp or a naive "YYYY-MM-DDTHH:MM[:SS]" time
/// taken as UTC.
fn parse_time(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(anyhow::anyhow!(
        "Invalid time {:?}: expected RFC 3339 or YYYY-MM-DDTHH:MM",
        input
    ))
}

/// Routes to sweep when no route is given: the backend catalog, or the
/// compiled default list if the catalog call fails or comes back empty.
async fn route_catalog<A: AnalyticsApi>(api: &A) -> Vec<String> {
    match api.list_routes().await {
        Ok(routes) if !routes.is_empty() => {
            let mut ids: Vec<String> = routes.into_iter().map(|r| r.service_no).collect();
            ids.dedup();
            ids
        }
        Ok(_) => config::DEFAULT_ROUTES
            .iter()
            .map(|s| s.to_string())
            .collect(),
        Err(e) => {
            warn!(error = %e, "Could not fetch route catalog, using default route list");
            config::DEFAULT_ROUTES
                .iter()
                .map(|s| s.to_string())
                .collect()
        }
    }
}
