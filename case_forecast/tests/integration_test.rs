use approx::assert_relative_eq;
use case_forecast::data::{load_csv, ForecastInputs};
use case_forecast::geo::select_entities;
use case_forecast::metrics::evaluate;
use case_forecast::models::{FnRegressor, LinearRegressor};
use case_forecast::{FailurePolicy, ForecastConfig, ForecastError, GeoId, Orchestrator, Regressor};
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

// Helper function to create an intervention plan with case history
fn create_sample_plan() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();

    writeln!(
        file,
        "CountryName,RegionName,Date,NewCases,C1_School closing,C2_Workplace closing"
    )
    .unwrap();
    for (country, region, base) in [
        ("Italy", "", 10),
        ("United States", "Texas", 100),
        ("Brazil", "", 50),
    ] {
        for (i, day) in ["2020-07-29", "2020-07-30", "2020-07-31"].iter().enumerate() {
            writeln!(file, "{},{},{},{},1,1", country, region, day, base + 2 * i).unwrap();
        }
        for day in ["2020-08-01", "2020-08-02"] {
            writeln!(file, "{},{},{},,2,1", country, region, day).unwrap();
        }
    }

    file
}

fn create_config(dir: &std::path::Path) -> ForecastConfig {
    let text = format!(
        r#"{{
            "lookback_days": 3,
            "npi_cols": ["C1_School closing", "C2_Workplace closing"],
            "predict": {{
                "start_date": "2020-08-01",
                "end_date": "2020-08-03",
                "countries": ["United States", "Italy"],
                "output_file": "{}"
            }}
        }}"#,
        dir.join("predictions").join("preds.csv").display()
    );
    ForecastConfig::from_json_str(&text).unwrap()
}

#[test]
fn test_full_forecast_workflow() {
    let dir = tempdir().unwrap();

    // 1. Load configuration and intervention plan
    let config = create_config(dir.path());
    let plan = create_sample_plan();
    let frame = load_csv(plan.path()).unwrap();
    let inputs = ForecastInputs::from_dataframe(&frame, &config).unwrap();

    // 2. Load a linear model: last case value plus one, indicators ignored
    let model_path = dir.path().join("model.json");
    let mut coefficients = vec![0.0; 3 + 3 * 2];
    coefficients[2] = 1.0;
    fs::write(
        &model_path,
        serde_json::json!({ "coefficients": coefficients, "intercept": 1.0 }).to_string(),
    )
    .unwrap();
    let model = LinearRegressor::from_file(&model_path).unwrap();
    assert_eq!(model.n_features(), Some(9));

    // 3. Forecast the requested countries
    let entities = select_entities(&inputs.entities(), &config.predict.countries);
    assert_eq!(
        entities,
        vec![
            GeoId::new("United States", Some("Texas")),
            GeoId::country("Italy")
        ]
    );
    let output = Orchestrator::from_config(&config)
        .unwrap()
        .run(&entities, &inputs, &model)
        .unwrap();

    let values: Vec<f64> = output.predictions.records().iter().map(|r| r.value).collect();
    assert_eq!(values, vec![105.0, 106.0, 107.0, 15.0, 16.0, 17.0]);

    // 4. Write and read back the result table
    let output_file = config.predict.output_file.clone().unwrap();
    output.predictions.write_csv(&output_file).unwrap();

    let written = load_csv(&output_file).unwrap();
    assert_eq!(
        written.get_column_names(),
        vec!["CountryName", "RegionName", "Date", "PredictedDailyNewCases"]
    );
    assert_eq!(written.height(), 6);
    let predicted: Vec<f64> = written
        .column("PredictedDailyNewCases")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(predicted, values);

    // 5. Evaluate against observed cases
    let mut actuals = case_forecast::DailyTable::new(vec!["NewCases".to_string()]);
    for record in output.predictions.records() {
        actuals
            .insert(record.geo.clone(), record.date, vec![record.value + 1.0])
            .unwrap();
    }
    let accuracy = evaluate(&output.predictions, &actuals).unwrap();
    assert_eq!(accuracy.samples, 6);
    assert_relative_eq!(accuracy.mae, 1.0);
}

#[test]
fn test_mismatched_model_width_is_reported() {
    let dir = tempdir().unwrap();
    let config = create_config(dir.path());
    let plan = create_sample_plan();
    let frame = load_csv(plan.path()).unwrap();
    let inputs = ForecastInputs::from_dataframe(&frame, &config).unwrap();

    // Fitted on a lookback of two days
    let model = LinearRegressor::new(vec![0.1; 2 + 2 * 2], 0.0).unwrap();
    let entities = select_entities(&inputs.entities(), &config.predict.countries);

    let err = Orchestrator::from_config(&config)
        .unwrap()
        .run(&entities, &inputs, &model)
        .unwrap_err();
    assert!(err.to_string().contains("expects 6 features, got 9"));
}

#[test]
fn test_entity_without_case_values_is_not_dropped() {
    let mut plan = NamedTempFile::new().unwrap();
    writeln!(plan, "CountryName,RegionName,Date,NewCases,C1_School closing").unwrap();
    for day in ["2020-07-30", "2020-07-31"] {
        writeln!(plan, "Italy,,{},5,1", day).unwrap();
        writeln!(plan, "Spain,,{},,1", day).unwrap();
    }
    writeln!(plan, "Italy,,2020-08-01,,1").unwrap();
    writeln!(plan, "Spain,,2020-08-01,,1").unwrap();

    let config = ForecastConfig::from_json_str(
        r#"{
            "lookback_days": 2,
            "npi_cols": ["C1_School closing"],
            "predict": {
                "start_date": "2020-08-01",
                "end_date": "2020-08-01",
                "countries": ["Italy", "Spain"]
            }
        }"#,
    )
    .unwrap();
    let frame = load_csv(plan.path()).unwrap();
    let inputs = ForecastInputs::from_dataframe(&frame, &config).unwrap();
    let spain = GeoId::country("Spain");

    let entities = select_entities(&inputs.entities(), &config.predict.countries);
    assert_eq!(entities, vec![GeoId::country("Italy"), spain.clone()]);

    let model = FnRegressor::new("last", |x: &[f64]| x[1]);
    let err = Orchestrator::from_config(&config)
        .unwrap()
        .run(&entities, &inputs, &model)
        .unwrap_err();
    match err {
        ForecastError::InsufficientHistory { geo_id, got, .. } => {
            assert_eq!(geo_id, spain.token());
            assert_eq!(got, 0);
        }
        other => panic!("Expected InsufficientHistory, got {:?}", other),
    }

    let output = Orchestrator::from_config(&config)
        .unwrap()
        .with_failure_policy(FailurePolicy::Skip)
        .run(&entities, &inputs, &model)
        .unwrap();
    assert_eq!(output.predictions.len(), 1);
    assert_eq!(output.skipped.len(), 1);
    assert_eq!(output.skipped[0].geo, spain);
}
