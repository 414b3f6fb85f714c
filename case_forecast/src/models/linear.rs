//! Linear regression model loaded from fitted coefficients

use crate::error::{ForecastError, Result};
use crate::models::Regressor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Linear model `intercept + coefficients · x`, as produced by ordinary
/// least squares or lasso fitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    /// One coefficient per feature
    pub coefficients: Vec<f64>,
    /// Constant term
    #[serde(default)]
    pub intercept: f64,
}

impl LinearRegressor {
    /// Create a model from its coefficients
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Linear model needs at least one coefficient".to_string(),
            ));
        }

        if coefficients.iter().any(|c| !c.is_finite()) || !intercept.is_finite() {
            return Err(ForecastError::InvalidParameter(
                "Linear model coefficients must be finite".to_string(),
            ));
        }

        Ok(Self {
            coefficients,
            intercept,
        })
    }

    /// Load a model stored as JSON (`{"coefficients": [...], "intercept": ...}`)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&text)?;

        Self::new(model.coefficients, model.intercept)
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(ForecastError::DataError(format!(
                "Linear model has {} coefficients, got {} features",
                self.coefficients.len(),
                features.len()
            )));
        }

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(c, x)| c * x)
            .sum();

        Ok(self.intercept + dot)
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn name(&self) -> &str {
        "linear"
    }
}
