//! Run configuration and engine settings

use crate::data::{MOVING_AVERAGE_COLUMN, NEW_CASES_COLUMN};
use crate::error::{ForecastError, Result};
use crate::utils::daily_range;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Intervention indicator columns the models are usually fitted on
pub const DEFAULT_NPI_COLUMNS: [&str; 12] = [
    "C1_School closing",
    "C2_Workplace closing",
    "C3_Cancel public events",
    "C4_Restrictions on gatherings",
    "C5_Close public transport",
    "C6_Stay at home requirements",
    "C7_Restrictions on internal movement",
    "C8_International travel controls",
    "H1_Public information campaigns",
    "H2_Testing policy",
    "H3_Contact tracing",
    "H6_Facial Coverings",
];

/// How a lookback block treats fewer than `L` available rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Exactly `L` rows are required
    Strict,
    /// Use however many rows exist, without padding
    BestEffort,
}

/// What the orchestrator does with an entity that cannot be initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole run
    #[default]
    Abort,
    /// Leave the entity out and report it
    Skip,
}

/// Settings of one forecast run, as read by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSettings {
    /// Lookback horizon `L` in days
    pub lookback_days: usize,
    /// First predicted day
    pub start_date: NaiveDate,
    /// Last predicted day, included
    pub end_date: NaiveDate,
    /// Policy for the case-window block
    pub case_window: WindowPolicy,
    /// Policy for the time-varying covariate and indicator blocks
    pub covariate_window: WindowPolicy,
}

impl ForecastSettings {
    /// Create settings with the default window policies
    pub fn new(lookback_days: usize, start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if lookback_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "Lookback days must be positive".to_string(),
            ));
        }

        if start_date > end_date {
            return Err(ForecastError::InvalidParameter(format!(
                "Start date {} is after end date {}",
                start_date, end_date
            )));
        }

        Ok(Self {
            lookback_days,
            start_date,
            end_date,
            case_window: WindowPolicy::Strict,
            covariate_window: WindowPolicy::BestEffort,
        })
    }

    /// Set the case-window policy
    pub fn with_case_window(mut self, policy: WindowPolicy) -> Self {
        self.case_window = policy;
        self
    }

    /// Set the covariate-window policy
    pub fn with_covariate_window(mut self, policy: WindowPolicy) -> Self {
        self.covariate_window = policy;
        self
    }

    /// Number of predicted days per entity
    pub fn horizon_days(&self) -> usize {
        daily_range(self.start_date, self.end_date).count()
    }
}

/// Prediction section of the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Countries to forecast; empty means every entity in the input
    #[serde(default)]
    pub countries: Vec<String>,
    /// Read the smoothed `MA` column instead of `NewCases`
    #[serde(default)]
    pub moving_average: bool,
    #[serde(default)]
    pub input_file: Option<PathBuf>,
    #[serde(default)]
    pub model_file: Option<PathBuf>,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
    /// Forecast entities on a thread pool
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub on_insufficient_history: FailurePolicy,
    #[serde(default = "default_case_window")]
    pub case_window: WindowPolicy,
    #[serde(default = "default_covariate_window")]
    pub covariate_window: WindowPolicy,
}

/// Complete run configuration, as stored in the JSON configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub lookback_days: usize,
    #[serde(default)]
    pub adj_cols_fixed: Vec<String>,
    #[serde(default)]
    pub adj_cols_time: Vec<String>,
    #[serde(default = "default_npi_cols")]
    pub npi_cols: Vec<String>,
    pub predict: PredictConfig,
}

fn default_case_window() -> WindowPolicy {
    WindowPolicy::Strict
}

fn default_covariate_window() -> WindowPolicy {
    WindowPolicy::BestEffort
}

fn default_npi_cols() -> Vec<String> {
    DEFAULT_NPI_COLUMNS.iter().map(|c| c.to_string()).collect()
}

impl ForecastConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            ForecastError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;

        Self::from_json_str(&text)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    /// Check the configuration for values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            return Err(ForecastError::ConfigError(
                "lookback_days must be positive".to_string(),
            ));
        }

        if self.predict.start_date > self.predict.end_date {
            return Err(ForecastError::ConfigError(format!(
                "start_date {} is after end_date {}",
                self.predict.start_date, self.predict.end_date
            )));
        }

        if self.npi_cols.is_empty() {
            return Err(ForecastError::ConfigError(
                "npi_cols must name at least one column".to_string(),
            ));
        }

        Ok(())
    }

    /// Name of the case column the model reads
    pub fn case_column(&self) -> &'static str {
        if self.predict.moving_average {
            MOVING_AVERAGE_COLUMN
        } else {
            NEW_CASES_COLUMN
        }
    }

    /// Engine settings for this configuration
    pub fn settings(&self) -> Result<ForecastSettings> {
        Ok(
            ForecastSettings::new(
                self.lookback_days,
                self.predict.start_date,
                self.predict.end_date,
            )?
            .with_case_window(self.predict.case_window)
            .with_covariate_window(self.predict.covariate_window),
        )
    }
}
