//! Multi-entity forecast runs

use crate::config::{FailurePolicy, ForecastConfig, ForecastSettings};
use crate::data::ForecastInputs;
use crate::error::{ForecastError, Result};
use crate::forecast::{forecast_entity, PredictionRecord};
use crate::geo::GeoId;
use crate::models::Regressor;
use crate::output::PredictionTable;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;

/// An entity left out of a run under [`FailurePolicy::Skip`]
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntity {
    pub geo: GeoId,
    pub reason: String,
}

/// Result of a run: merged predictions plus any entities that were skipped
#[derive(Debug, Clone, Default)]
pub struct ForecastOutput {
    pub predictions: PredictionTable,
    pub skipped: Vec<SkippedEntity>,
}

/// Forecasts every requested entity independently and merges the results
#[derive(Debug, Clone)]
pub struct Orchestrator {
    settings: ForecastSettings,
    failure_policy: FailurePolicy,
    parallel: bool,
}

impl Orchestrator {
    /// Create an orchestrator that aborts on the first failing entity and runs sequentially
    pub fn new(settings: ForecastSettings) -> Self {
        Self {
            settings,
            failure_policy: FailurePolicy::Abort,
            parallel: false,
        }
    }

    /// Create an orchestrator from a run configuration
    pub fn from_config(config: &ForecastConfig) -> Result<Self> {
        Ok(Self::new(config.settings()?)
            .with_failure_policy(config.predict.on_insufficient_history)
            .with_parallel(config.predict.parallel))
    }

    /// Set what happens to entities that fail to initialize
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Forecast entities on the rayon thread pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Engine settings
    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    /// Forecast `entities` and merge their predictions in request order.
    ///
    /// Repeated entities are forecast once, at their first position. Only
    /// initialization failures are subject to the failure policy; every other
    /// error aborts the run. Sequential runs stop at the first aborting entity.
    pub fn run<M: Regressor + ?Sized>(
        &self,
        entities: &[GeoId],
        inputs: &ForecastInputs,
        model: &M,
    ) -> Result<ForecastOutput> {
        let entities = unique_entities(entities);

        info!(
            "Forecasting {} entities from {} to {} (lookback {} days)",
            entities.len(),
            self.settings.start_date,
            self.settings.end_date,
            self.settings.lookback_days
        );

        let mut output = ForecastOutput::default();
        if self.parallel {
            let results: Vec<Result<Vec<PredictionRecord>>> = entities
                .par_iter()
                .map(|geo| forecast_entity(geo, inputs, &self.settings, model))
                .collect();

            for (geo, result) in entities.iter().zip(results) {
                self.merge(geo, result, &mut output)?;
            }
        } else {
            for geo in &entities {
                let result = forecast_entity(geo, inputs, &self.settings, model);
                self.merge(geo, result, &mut output)?;
            }
        }

        info!(
            "Produced {} predictions, skipped {} entities",
            output.predictions.len(),
            output.skipped.len()
        );

        Ok(output)
    }

    fn merge(
        &self,
        geo: &GeoId,
        result: Result<Vec<PredictionRecord>>,
        output: &mut ForecastOutput,
    ) -> Result<()> {
        match result {
            Ok(records) => {
                output.predictions.extend_entity(records);
                Ok(())
            }
            Err(err) => self.handle_failure(geo, err, output),
        }
    }

    fn handle_failure(
        &self,
        geo: &GeoId,
        err: ForecastError,
        output: &mut ForecastOutput,
    ) -> Result<()> {
        match self.failure_policy {
            FailurePolicy::Skip if err.is_initialization_failure() => {
                warn!("Skipping {}: {}", geo, err);
                output.skipped.push(SkippedEntity {
                    geo: geo.clone(),
                    reason: err.to_string(),
                });
                Ok(())
            }
            _ => Err(err),
        }
    }
}

fn unique_entities(entities: &[GeoId]) -> Vec<&GeoId> {
    let mut seen = HashSet::with_capacity(entities.len());
    let unique: Vec<&GeoId> = entities.iter().filter(|geo| seen.insert(*geo)).collect();

    if unique.len() < entities.len() {
        debug!(
            "Ignoring {} repeated entities",
            entities.len() - unique.len()
        );
    }

    unique
}
