//! Error types for the case_forecast crate

use chrono::NaiveDate;
use thiserror::Error;

/// Stage of the per-entity forecast in which a covariate lookup failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CovariateStage {
    /// Fixed covariates read at exactly the current date
    Fixed,
    /// Time-varying covariates read over the lookback window
    TimeVarying,
    /// Intervention indicators read over the lookback window
    Indicators,
}

impl std::fmt::Display for CovariateStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CovariateStage::Fixed => write!(f, "fixed covariates"),
            CovariateStage::TimeVarying => write!(f, "time-varying covariates"),
            CovariateStage::Indicators => write!(f, "indicators"),
        }
    }
}

/// Custom error types for the case_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Fewer than the lookback horizon of case rows precede the start date
    #[error(
        "Insufficient history for {geo_id}: need {needed} days before {start_date}, found {got}"
    )]
    InsufficientHistory {
        geo_id: String,
        start_date: NaiveDate,
        needed: usize,
        got: usize,
    },

    /// A covariate row the feature vector needs is absent
    #[error("Missing {stage} for {geo_id} on {date}: {column}")]
    MissingCovariate {
        geo_id: String,
        date: NaiveDate,
        column: String,
        stage: CovariateStage,
    },

    /// The assembled feature vector does not have the width the model was fitted on
    #[error("Malformed model input for {geo_id} on {date}: model expects {expected} features, got {got}")]
    MalformedModelInput {
        geo_id: String,
        date: NaiveDate,
        expected: usize,
        got: usize,
    },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error in the run configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

impl ForecastError {
    /// Whether the error happened while building an entity's initial window
    pub fn is_initialization_failure(&self) -> bool {
        matches!(self, ForecastError::InsufficientHistory { .. })
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<polars::prelude::PolarsError> for ForecastError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
