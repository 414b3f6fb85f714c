//! # Case Forecast
//!
//! Rolling autoregressive forecasts of daily new cases for countries and
//! regions, driven by a fitted regression model and per-day intervention
//! indicator levels.
//!
//! ## Features
//!
//! - Per-entity lookback windows fed with the entity's own predictions
//! - Feature vectors in a fixed block order: case window, fixed covariates,
//!   time-varying covariates, intervention indicators
//! - Non-negative predictions, one per entity per day, no gaps
//! - Optional parallel forecasting of independent entities
//! - JSON run configuration and CSV input/output through polars
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use case_forecast::data::{load_csv, ForecastInputs};
//! use case_forecast::geo::select_entities;
//! use case_forecast::models::LinearRegressor;
//! use case_forecast::{ForecastConfig, Orchestrator};
//!
//! # fn main() -> case_forecast::Result<()> {
//! let config = ForecastConfig::from_file("config.json")?;
//! let frame = load_csv("interventions_plan.csv")?;
//! let inputs = ForecastInputs::from_dataframe(&frame, &config)?;
//! let model = LinearRegressor::from_file("model.json")?;
//!
//! let entities = select_entities(&inputs.entities(), &config.predict.countries);
//! let output = Orchestrator::from_config(&config)?.run(&entities, &inputs, &model)?;
//! output.predictions.write_csv("predictions/preds.csv")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod geo;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod utils;
pub mod window;

// Re-export commonly used types
pub use crate::config::{FailurePolicy, ForecastConfig, ForecastSettings, WindowPolicy};
pub use crate::data::{DailyTable, ForecastInputs};
pub use crate::error::{ForecastError, Result};
pub use crate::forecast::{forecast_entity, EntityForecaster, ForecastState, PredictionRecord};
pub use crate::geo::GeoId;
pub use crate::models::Regressor;
pub use crate::orchestrator::{ForecastOutput, Orchestrator};
pub use crate::output::PredictionTable;
pub use crate::window::LookbackWindow;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
