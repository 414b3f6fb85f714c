//! Feature vector assembly for one entity and one day
//!
//! Blocks are concatenated in a fixed order the model was fitted against:
//!
//! 1. the last `L` case values from the lookback window,
//! 2. fixed covariates on exactly the current date,
//! 3. time-varying covariates over `[current_date - L, current_date)`,
//! 4. intervention indicators over `[current_date - L, current_date)`.

use crate::config::WindowPolicy;
use crate::data::{DailyTable, EntitySeries};
use crate::error::{CovariateStage, ForecastError, Result};
use crate::geo::GeoId;
use crate::utils::{days_before, missing_days};
use crate::window::LookbackWindow;
use chrono::NaiveDate;

/// Widths of the feature blocks for complete windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLayout {
    pub lookback_days: usize,
    pub n_fixed: usize,
    pub n_time: usize,
    pub n_indicators: usize,
}

impl FeatureLayout {
    /// Total width when every window has `L` rows
    pub fn width(&self) -> usize {
        self.lookback_days
            + self.n_fixed
            + self.lookback_days * self.n_time
            + self.lookback_days * self.n_indicators
    }
}

/// Covariate table columns and one entity's rows in it
#[derive(Debug, Clone, Copy)]
struct Block<'a> {
    columns: &'a [String],
    rows: EntitySeries<'a>,
    stage: CovariateStage,
}

impl<'a> Block<'a> {
    fn new(table: &'a DailyTable, geo: &GeoId, stage: CovariateStage) -> Self {
        Self {
            columns: table.columns(),
            rows: table.entity(geo),
            stage,
        }
    }
}

/// Builds feature vectors for one entity from its slices of the input tables
#[derive(Debug, Clone)]
pub struct FeatureAssembler<'a> {
    geo: &'a GeoId,
    lookback_days: usize,
    covariate_window: WindowPolicy,
    fixed: Block<'a>,
    time: Block<'a>,
    indicators: Block<'a>,
}

impl<'a> FeatureAssembler<'a> {
    /// Create an assembler reading `geo`'s rows from the covariate tables
    pub fn new(
        geo: &'a GeoId,
        lookback_days: usize,
        covariate_window: WindowPolicy,
        indicators: &'a DailyTable,
        fixed_covariates: &'a DailyTable,
        time_covariates: &'a DailyTable,
    ) -> Self {
        Self {
            geo,
            lookback_days,
            covariate_window,
            fixed: Block::new(fixed_covariates, geo, CovariateStage::Fixed),
            time: Block::new(time_covariates, geo, CovariateStage::TimeVarying),
            indicators: Block::new(indicators, geo, CovariateStage::Indicators),
        }
    }

    /// Block widths this assembler produces for complete windows
    pub fn layout(&self) -> FeatureLayout {
        FeatureLayout {
            lookback_days: self.lookback_days,
            n_fixed: self.fixed.columns.len(),
            n_time: self.time.columns.len(),
            n_indicators: self.indicators.columns.len(),
        }
    }

    /// Assemble the flat feature vector for `current_date`
    pub fn build(&self, current_date: NaiveDate, window: &LookbackWindow) -> Result<Vec<f64>> {
        let mut features = Vec::with_capacity(self.layout().width());

        features.extend(window.last(self.lookback_days));
        self.push_fixed(current_date, &mut features)?;
        self.push_window(self.time, current_date, &mut features)?;
        self.push_window(self.indicators, current_date, &mut features)?;

        Ok(features)
    }

    fn push_fixed(&self, current_date: NaiveDate, features: &mut Vec<f64>) -> Result<()> {
        if self.fixed.columns.is_empty() {
            return Ok(());
        }

        let values = self
            .fixed
            .rows
            .at(current_date)
            .ok_or_else(|| self.missing(self.fixed, current_date))?;
        features.extend_from_slice(values);

        Ok(())
    }

    fn push_window(
        &self,
        block: Block<'a>,
        current_date: NaiveDate,
        features: &mut Vec<f64>,
    ) -> Result<()> {
        if block.columns.is_empty() {
            return Ok(());
        }

        let from = days_before(current_date, self.lookback_days)?;
        let rows = block.rows.range(from, current_date);

        if self.covariate_window == WindowPolicy::Strict && rows.len() < self.lookback_days {
            let present: Vec<NaiveDate> = rows.iter().map(|(date, _)| *date).collect();
            let first_gap = missing_days(from, current_date, &present)
                .first()
                .copied()
                .unwrap_or(from);
            return Err(self.missing(block, first_gap));
        }

        for (_, values) in rows {
            features.extend_from_slice(values);
        }

        Ok(())
    }

    fn missing(&self, block: Block<'_>, date: NaiveDate) -> ForecastError {
        ForecastError::MissingCovariate {
            geo_id: self.geo.token(),
            date,
            column: block.columns.join(", "),
            stage: block.stage,
        }
    }
}
