//! Rolling forecast loop for a single entity

use crate::config::{ForecastSettings, WindowPolicy};
use crate::data::ForecastInputs;
use crate::error::{ForecastError, Result};
use crate::features::FeatureAssembler;
use crate::geo::GeoId;
use crate::models::Regressor;
use crate::utils::days_before;
use crate::window::LookbackWindow;
use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

/// One predicted day for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub geo: GeoId,
    pub date: NaiveDate,
    pub value: f64,
}

impl PredictionRecord {
    /// Country component of the entity
    pub fn country(&self) -> &str {
        self.geo.country_name()
    }

    /// Region component of the entity, if any
    pub fn region(&self) -> Option<&str> {
        self.geo.region_name()
    }
}

/// Where an entity's forecast loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastState {
    /// The lookback window has not been built yet
    Initializing,
    /// The next prediction is for `current_date`
    Stepping { current_date: NaiveDate },
    /// Every day up to the end date has been predicted
    Done,
}

/// Negative model outputs are not meaningful case counts and become zero
pub fn clamp_prediction(raw: f64) -> f64 {
    if raw > 0.0 {
        raw
    } else {
        0.0
    }
}

/// Walks one entity day by day from the start date to the end date,
/// feeding each clamped prediction back into its lookback window
pub struct EntityForecaster<'a, M: Regressor + ?Sized> {
    geo: &'a GeoId,
    inputs: &'a ForecastInputs,
    settings: &'a ForecastSettings,
    model: &'a M,
    assembler: FeatureAssembler<'a>,
    window: Option<LookbackWindow>,
    state: ForecastState,
    predictions: Vec<PredictionRecord>,
}

impl<'a, M: Regressor + ?Sized> EntityForecaster<'a, M> {
    /// Create a forecaster in the initializing state
    pub fn new(
        geo: &'a GeoId,
        inputs: &'a ForecastInputs,
        settings: &'a ForecastSettings,
        model: &'a M,
    ) -> Self {
        let assembler = FeatureAssembler::new(
            geo,
            settings.lookback_days,
            settings.covariate_window,
            &inputs.indicators,
            &inputs.fixed_covariates,
            &inputs.time_covariates,
        );

        Self {
            geo,
            inputs,
            settings,
            model,
            assembler,
            window: None,
            state: ForecastState::Initializing,
            predictions: Vec::with_capacity(settings.horizon_days()),
        }
    }

    /// Current state of the loop
    pub fn state(&self) -> ForecastState {
        self.state
    }

    /// The lookback window, once initialized
    pub fn window(&self) -> Option<&LookbackWindow> {
        self.window.as_ref()
    }

    /// Build the lookback window from the `L` days before the start date
    pub fn initialize(&mut self) -> Result<()> {
        if self.state != ForecastState::Initializing {
            return Ok(());
        }

        let lookback = self.settings.lookback_days;
        let start_date = self.settings.start_date;
        let from = days_before(start_date, lookback)?;

        let cases = &self.inputs.cases;
        if cases.width() != 1 {
            return Err(ForecastError::DataError(format!(
                "Case table must have exactly one column, got {:?}",
                cases.columns()
            )));
        }

        let history: Vec<f64> = cases
            .entity(self.geo)
            .range(from, start_date)
            .into_iter()
            .filter_map(|(_, values)| values.first().copied())
            .collect();

        let short = match self.settings.case_window {
            WindowPolicy::Strict => history.len() < lookback,
            WindowPolicy::BestEffort => history.is_empty(),
        };
        if short {
            return Err(ForecastError::InsufficientHistory {
                geo_id: self.geo.token(),
                start_date,
                needed: lookback,
                got: history.len(),
            });
        }

        let window = match self.settings.case_window {
            WindowPolicy::Strict => LookbackWindow::new(lookback, &history)?,
            WindowPolicy::BestEffort => LookbackWindow::partial(lookback, &history)?,
        };

        debug!(
            "{}: initialized window with {} of {} days before {}",
            self.geo,
            window.len(),
            lookback,
            start_date
        );

        self.window = Some(window);
        self.state = ForecastState::Stepping {
            current_date: start_date,
        };

        Ok(())
    }

    /// Predict the next day, initializing first if needed.
    ///
    /// Returns `None` once the end date has been predicted.
    pub fn step(&mut self) -> Result<Option<&PredictionRecord>> {
        if self.state == ForecastState::Initializing {
            self.initialize()?;
        }

        let current_date = match self.state {
            ForecastState::Stepping { current_date } => current_date,
            _ => return Ok(None),
        };

        let window = self.window.as_mut().ok_or_else(|| {
            ForecastError::DataError(format!("{}: lookback window missing", self.geo))
        })?;

        let features = self.assembler.build(current_date, window)?;

        if let Some(expected) = self.model.n_features() {
            if features.len() != expected {
                return Err(ForecastError::MalformedModelInput {
                    geo_id: self.geo.token(),
                    date: current_date,
                    expected,
                    got: features.len(),
                });
            }
        }

        let raw = self.model.predict(&features)?;
        let value = clamp_prediction(raw);
        debug!(
            "{} {}: raw {:.4}, predicted {:.4}",
            self.geo, current_date, raw, value
        );

        window.append(value);
        self.predictions.push(PredictionRecord {
            geo: self.geo.clone(),
            date: current_date,
            value,
        });

        self.state = match current_date.succ_opt() {
            Some(next) if next <= self.settings.end_date => ForecastState::Stepping {
                current_date: next,
            },
            _ => ForecastState::Done,
        };

        Ok(self.predictions.last())
    }

    /// Run the loop to the end date and return the entity's predictions in date order
    pub fn run(mut self) -> Result<Vec<PredictionRecord>> {
        while self.step()?.is_some() {}

        info!(
            "{}: predicted {} days with {}",
            self.geo,
            self.predictions.len(),
            self.model.name()
        );

        Ok(self.predictions)
    }
}

/// Forecast one entity over the configured date range
pub fn forecast_entity<M: Regressor + ?Sized>(
    geo: &GeoId,
    inputs: &ForecastInputs,
    settings: &ForecastSettings,
    model: &M,
) -> Result<Vec<PredictionRecord>> {
    EntityForecaster::new(geo, inputs, settings, model).run()
}
