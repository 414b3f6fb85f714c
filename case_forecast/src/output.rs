//! Merged prediction table and its persistence

use crate::data::{format_date, COUNTRY_COLUMN, DATE_COLUMN, REGION_COLUMN};
use crate::error::Result;
use crate::forecast::PredictionRecord;
use crate::geo::GeoId;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

/// Predicted value column in the output frame
pub const PREDICTION_COLUMN: &str = "PredictedDailyNewCases";

/// Predictions of a run, grouped by entity in request order and by date within an entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionTable {
    records: Vec<PredictionRecord>,
}

impl PredictionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entity's predictions after those already merged
    pub fn extend_entity(&mut self, records: Vec<PredictionRecord>) {
        self.records.extend(records);
    }

    /// All records
    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    /// Records of one entity
    pub fn for_entity<'a>(&'a self, geo: &'a GeoId) -> impl Iterator<Item = &'a PredictionRecord> {
        self.records.iter().filter(move |r| &r.geo == geo)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Frame with `CountryName, RegionName, Date, PredictedDailyNewCases`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let countries: Vec<&str> = self.records.iter().map(|r| r.country()).collect();
        let regions: Vec<Option<&str>> = self.records.iter().map(|r| r.region()).collect();
        let dates: Vec<String> = self.records.iter().map(|r| format_date(r.date)).collect();
        let values: Vec<f64> = self.records.iter().map(|r| r.value).collect();

        let df = DataFrame::new(vec![
            Series::new(COUNTRY_COLUMN, countries),
            Series::new(REGION_COLUMN, regions),
            Series::new(DATE_COLUMN, dates),
            Series::new(PREDICTION_COLUMN, values),
        ])?;

        Ok(df)
    }

    /// Write the table as CSV, creating missing parent directories
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut df = self.to_dataframe()?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;

        Ok(())
    }
}

impl IntoIterator for PredictionTable {
    type Item = PredictionRecord;
    type IntoIter = std::vec::IntoIter<PredictionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
