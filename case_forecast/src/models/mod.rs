//! Regression models consumed by the forecast loop

use crate::error::Result;
use std::fmt;

/// A fitted model mapping one flat feature vector to one prediction.
///
/// Implementations are read-only under inference so a single model can be
/// shared by concurrent entity workers.
pub trait Regressor: Send + Sync {
    /// Predict a single value from a single sample
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Feature width the model was fitted on, if known
    fn n_features(&self) -> Option<usize> {
        None
    }

    /// Name of the model
    fn name(&self) -> &str {
        "regressor"
    }
}

impl<R: Regressor + ?Sized> Regressor for &R {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        (**self).predict(features)
    }

    fn n_features(&self) -> Option<usize> {
        (**self).n_features()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<R: Regressor + ?Sized> Regressor for Box<R> {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        (**self).predict(features)
    }

    fn n_features(&self) -> Option<usize> {
        (**self).n_features()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Closure-backed model
pub struct FnRegressor<F> {
    name: String,
    n_features: Option<usize>,
    func: F,
}

impl<F> FnRegressor<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    /// Wrap a function of the feature vector
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            n_features: None,
            func,
        }
    }

    /// Declare the feature width the function expects
    pub fn with_n_features(mut self, n_features: usize) -> Self {
        self.n_features = Some(n_features);
        self
    }
}

impl<F> fmt::Debug for FnRegressor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRegressor")
            .field("name", &self.name)
            .field("n_features", &self.n_features)
            .finish()
    }
}

impl<F> Regressor for FnRegressor<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn predict(&self, features: &[f64]) -> Result<f64> {
        Ok((self.func)(features))
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub mod linear;

pub use linear::LinearRegressor;
