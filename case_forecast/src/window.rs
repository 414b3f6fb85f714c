//! Fixed-length window of an entity's most recent case values

use crate::error::{ForecastError, Result};
use std::collections::VecDeque;

/// Most recent observed or predicted values for one entity.
///
/// Only the last `horizon` values are ever read, so older values are
/// discarded on append.
#[derive(Debug, Clone, PartialEq)]
pub struct LookbackWindow {
    buffer: VecDeque<f64>,
    horizon: usize,
}

impl LookbackWindow {
    /// Create a full window from at least `horizon` historical values.
    ///
    /// Only the trailing `horizon` values are kept. The caller maps a short
    /// history to its own error with context.
    pub fn new(horizon: usize, values: &[f64]) -> Result<Self> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Lookback horizon must be positive".to_string(),
            ));
        }

        if values.len() < horizon {
            return Err(ForecastError::DataError(format!(
                "Lookback window needs {} values, got {}",
                horizon,
                values.len()
            )));
        }

        Ok(Self::filled(horizon, values))
    }

    /// Create a window that may hold fewer than `horizon` values
    pub fn partial(horizon: usize, values: &[f64]) -> Result<Self> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Lookback horizon must be positive".to_string(),
            ));
        }

        if values.is_empty() {
            return Err(ForecastError::DataError(
                "Lookback window needs at least one value".to_string(),
            ));
        }

        Ok(Self::filled(horizon, values))
    }

    fn filled(horizon: usize, values: &[f64]) -> Self {
        let start = values.len().saturating_sub(horizon);
        let mut buffer = VecDeque::with_capacity(horizon);
        buffer.extend(values[start..].iter().copied());

        Self { buffer, horizon }
    }

    /// Add a value at the tail, evicting the oldest once the window is full
    pub fn append(&mut self, value: f64) {
        if self.buffer.len() >= self.horizon {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    /// The most recent `n` values, oldest first; `n` is capped at the current length
    pub fn last(&self, n: usize) -> Vec<f64> {
        let skip = self.buffer.len().saturating_sub(n);
        self.buffer.iter().skip(skip).copied().collect()
    }

    /// Lookback horizon
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Number of values currently held
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the window holds no values
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if the window holds `horizon` values
    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.horizon
    }
}
