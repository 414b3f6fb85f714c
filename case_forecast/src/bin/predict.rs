use anyhow::{Context, Result};
use case_forecast::data::{load_csv, parse_date, ForecastInputs};
use case_forecast::geo::select_entities;
use case_forecast::models::LinearRegressor;
use case_forecast::{ForecastConfig, Orchestrator};
use clap::Parser;
use std::path::PathBuf;

/// Generate daily new case predictions for the given intervention plans
#[derive(Parser)]
#[command(name = "predict")]
#[command(about = "Predict daily new cases per country and region", long_about = None)]
struct Cli {
    /// Start date from which to predict, included, as YYYY-MM-DD
    #[arg(short = 's', long = "start_date")]
    start_date: Option<String>,
    /// End date for the last prediction, included, as YYYY-MM-DD
    #[arg(short = 'e', long = "end_date")]
    end_date: Option<String>,
    /// Intervention plan CSV file with case history and indicator levels
    #[arg(short = 'i', long = "interventions_plan")]
    ip_file: Option<PathBuf>,
    /// CSV file where predictions are written
    #[arg(short = 'o', long = "output_file")]
    output_file: Option<PathBuf>,
    /// JSON configuration file
    #[arg(short = 'c', long = "config", default_value = "config.json")]
    config: PathBuf,
    /// JSON file with the fitted linear model
    #[arg(short = 'm', long = "model")]
    model: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = ForecastConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(start) = &cli.start_date {
        config.predict.start_date = parse_date(start)?;
    }
    if let Some(end) = &cli.end_date {
        config.predict.end_date = parse_date(end)?;
    }
    config.validate()?;

    let ip_file = cli
        .ip_file
        .or_else(|| config.predict.input_file.clone())
        .context("no intervention plan file given")?;
    let model_file = cli
        .model
        .or_else(|| config.predict.model_file.clone())
        .context("no model file given")?;
    let output_file = cli
        .output_file
        .or_else(|| config.predict.output_file.clone())
        .context("no output file given")?;

    log::info!(
        "Generating predictions from {} to {}...",
        config.predict.start_date,
        config.predict.end_date
    );

    let frame = load_csv(&ip_file).with_context(|| format!("reading {}", ip_file.display()))?;
    let inputs = ForecastInputs::from_dataframe(&frame, &config)?;
    let model = LinearRegressor::from_file(&model_file)
        .with_context(|| format!("loading model {}", model_file.display()))?;

    let entities = select_entities(&inputs.entities(), &config.predict.countries);
    let output = Orchestrator::from_config(&config)?.run(&entities, &inputs, &model)?;

    for skipped in &output.skipped {
        log::warn!("No predictions for {}: {}", skipped.geo, skipped.reason);
    }

    output
        .predictions
        .write_csv(&output_file)
        .with_context(|| format!("writing {}", output_file.display()))?;
    log::info!("Saved predictions to {}", output_file.display());

    Ok(())
}
