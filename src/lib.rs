//! # NPI Forecast
//!
//! `npi_forecast_workspace` bundles the crates of the intervention-plan case
//! predictor under a single dependency.
//!
//! ## Example
//!
//! ```
//! use npi_forecast_workspace::prelude::*;
//!
//! let geo = GeoId::parse("United States__Texas").unwrap();
//! assert_eq!(geo.country_name(), "United States");
//! assert_eq!(geo.region_name(), Some("Texas"));
//! ```

pub use case_forecast;

/// The types most runs need
pub mod prelude {
    pub use case_forecast::data::{load_csv, ForecastInputs};
    pub use case_forecast::geo::select_entities;
    pub use case_forecast::models::{FnRegressor, LinearRegressor, Regressor};
    pub use case_forecast::{
        DailyTable, FailurePolicy, ForecastConfig, ForecastError, ForecastOutput,
        ForecastSettings, GeoId, Orchestrator, PredictionTable, WindowPolicy,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_runs_a_forecast() {
        let start: chrono::NaiveDate = "2020-08-01".parse().unwrap();
        let geo = GeoId::country("Italy");

        let mut cases = DailyTable::new(vec!["NewCases".to_string()]);
        let mut indicators = DailyTable::new(vec!["C1_School closing".to_string()]);
        for (offset, value) in [(2u64, 3.0), (1, 5.0)] {
            let day = start - chrono_days(offset);
            cases.insert(geo.clone(), day, vec![value]).unwrap();
            indicators.insert(geo.clone(), day, vec![1.0]).unwrap();
        }
        let inputs = ForecastInputs {
            cases,
            indicators,
            fixed_covariates: DailyTable::new(Vec::new()),
            time_covariates: DailyTable::new(Vec::new()),
        };

        let settings = ForecastSettings::new(2, start, start).unwrap();
        let model = FnRegressor::new("last+1", |x: &[f64]| x[1] + 1.0);
        let output = Orchestrator::new(settings)
            .run(&[geo], &inputs, &model)
            .unwrap();

        assert_eq!(output.predictions.records()[0].value, 6.0);
    }

    fn chrono_days(days: u64) -> chrono::Days {
        chrono::Days::new(days)
    }
}
