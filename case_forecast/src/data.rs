//! Daily per-entity tables and their DataFrame adapters

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::geo::GeoId;
use chrono::NaiveDate;
use log::debug;
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::path::Path;

/// Country column in input and output frames
pub const COUNTRY_COLUMN: &str = "CountryName";
/// Region column in input and output frames
pub const REGION_COLUMN: &str = "RegionName";
/// Date column in input and output frames
pub const DATE_COLUMN: &str = "Date";
/// Raw daily new cases
pub const NEW_CASES_COLUMN: &str = "NewCases";
/// Smoothed daily new cases
pub const MOVING_AVERAGE_COLUMN: &str = "MA";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Named numeric columns keyed by entity and day
#[derive(Debug, Clone, Default)]
pub struct DailyTable {
    /// Column names, in the order values are stored
    columns: Vec<String>,
    /// Entities in first-appearance order
    entities: Vec<GeoId>,
    /// Per-entity rows ordered by date
    rows: HashMap<GeoId, BTreeMap<NaiveDate, Vec<f64>>>,
}

/// Borrowed view of one entity's rows
#[derive(Debug, Clone, Copy)]
pub struct EntitySeries<'a> {
    rows: Option<&'a BTreeMap<NaiveDate, Vec<f64>>>,
}

impl DailyTable {
    /// Create an empty table with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            entities: Vec::new(),
            rows: HashMap::new(),
        }
    }

    /// Insert one row; the value count must match the column count
    pub fn insert(&mut self, geo: GeoId, date: NaiveDate, values: Vec<f64>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(ForecastError::DataError(format!(
                "Row for {} on {} has {} values, table has {} columns",
                geo,
                date,
                values.len(),
                self.columns.len()
            )));
        }

        if !self.rows.contains_key(&geo) {
            self.entities.push(geo.clone());
        }

        let entity_rows = self.rows.entry(geo).or_default();
        if entity_rows.contains_key(&date) {
            return Err(ForecastError::DataError(format!(
                "Duplicate row on {} in table with columns {:?}",
                date, self.columns
            )));
        }
        entity_rows.insert(date, values);

        Ok(())
    }

    /// Build a table from a frame holding the id columns and `columns`.
    ///
    /// Rows with a null in any of the selected value columns are left out.
    pub fn from_dataframe(df: &DataFrame, columns: &[String]) -> Result<Self> {
        let geos = geo_ids(df)?;
        let dates = dates(df)?;

        let mut value_columns = Vec::with_capacity(columns.len());
        for name in columns {
            value_columns.push(column_as_f64(df, name)?);
        }

        let mut table = Self::new(columns.to_vec());
        let mut skipped = 0usize;
        for (row, (geo, date)) in geos.into_iter().zip(dates).enumerate() {
            let values: Option<Vec<f64>> = value_columns.iter().map(|col| col[row]).collect();
            match values {
                Some(values) => table.insert(geo, date, values)?,
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(
                "Left out {} rows with missing values in {:?}",
                skipped, columns
            );
        }

        Ok(table)
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of value columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Entities in first-appearance order
    pub fn entities(&self) -> &[GeoId] {
        &self.entities
    }

    /// View of one entity's rows; empty when the entity is unknown
    pub fn entity(&self, geo: &GeoId) -> EntitySeries<'_> {
        EntitySeries {
            rows: self.rows.get(geo),
        }
    }

    /// Total number of rows across entities
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> EntitySeries<'a> {
    /// Values on exactly `date`
    pub fn at(&self, date: NaiveDate) -> Option<&'a [f64]> {
        self.rows
            .and_then(|rows| rows.get(&date))
            .map(Vec::as_slice)
    }

    /// Rows with `from <= date < until`, in date order
    pub fn range(&self, from: NaiveDate, until: NaiveDate) -> Vec<(NaiveDate, &'a [f64])> {
        match self.rows {
            Some(rows) if from < until => rows
                .range(from..until)
                .map(|(date, values)| (*date, values.as_slice()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.map_or(0, BTreeMap::len)
    }

    /// Check if the entity has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The four tables the engine reads, all keyed by the same (entity, date) pairs
#[derive(Debug, Clone)]
pub struct ForecastInputs {
    /// Case history, one column (`NewCases` or `MA`)
    pub cases: DailyTable,
    /// Intervention indicator levels
    pub indicators: DailyTable,
    /// Covariates read at exactly the predicted date
    pub fixed_covariates: DailyTable,
    /// Covariates read over the lookback window
    pub time_covariates: DailyTable,
}

impl ForecastInputs {
    /// Split one combined frame into the engine's tables using the run configuration
    pub fn from_dataframe(df: &DataFrame, config: &ForecastConfig) -> Result<Self> {
        let cases = DailyTable::from_dataframe(df, &[config.case_column().to_string()])?;
        let indicators = DailyTable::from_dataframe(df, &config.npi_cols)?;
        let fixed_covariates = DailyTable::from_dataframe(df, &config.adj_cols_fixed)?;
        let time_covariates = DailyTable::from_dataframe(df, &config.adj_cols_time)?;

        debug!(
            "Loaded {} case rows, {} indicator rows for {} entities",
            cases.len(),
            indicators.len(),
            cases.entities().len()
        );

        Ok(Self {
            cases,
            indicators,
            fixed_covariates,
            time_covariates,
        })
    }

    /// Every entity in the plan: indicator entities in first-appearance order,
    /// then entities that only have case rows.
    ///
    /// An entity whose case values are all missing is still listed, so the
    /// forecast reports its short history instead of dropping it.
    pub fn entities(&self) -> Vec<GeoId> {
        let mut seen = HashSet::new();
        self.indicators
            .entities()
            .iter()
            .chain(self.cases.entities())
            .filter(|geo| seen.insert(*geo))
            .cloned()
            .collect()
    }
}

/// Load a delimited file with a header row into a frame
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let file = File::open(path)?;
    let df = CsvReader::new(file)
        .infer_schema(None)
        .has_header(true)
        .finish()?;

    Ok(df)
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, DATE_FORMAT)
        .map_err(|e| ForecastError::DataError(format!("Invalid date '{}': {}", value, e)))
}

/// Format a date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Helper to read a column as strings regardless of its inferred type
fn column_as_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let col = df
        .column(name)
        .map_err(|e| ForecastError::DataError(format!("Column '{}' not found: {}", name, e)))?;
    let col = col.cast(&DataType::Utf8)?;

    let values = col
        .utf8()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();

    Ok(values)
}

/// Helper to read a column as f64 values, keeping nulls
fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = df
        .column(name)
        .map_err(|e| ForecastError::DataError(format!("Column '{}' not found: {}", name, e)))?;

    if !col.dtype().is_numeric() && col.dtype() != &DataType::Boolean {
        return Err(ForecastError::DataError(format!(
            "Column '{}' cannot be converted to f64",
            name
        )));
    }

    let col = col.cast(&DataType::Float64)?;
    let values = col.f64()?.into_iter().collect();

    Ok(values)
}

fn geo_ids(df: &DataFrame) -> Result<Vec<GeoId>> {
    let countries = column_as_strings(df, COUNTRY_COLUMN)?;
    let regions = column_as_strings(df, REGION_COLUMN)?;

    countries
        .into_iter()
        .zip(regions)
        .enumerate()
        .map(|(row, (country, region))| match country {
            Some(country) if !country.is_empty() => Ok(GeoId::new(country, region)),
            _ => Err(ForecastError::DataError(format!(
                "Row {} has no {}",
                row, COUNTRY_COLUMN
            ))),
        })
        .collect()
}

fn dates(df: &DataFrame) -> Result<Vec<NaiveDate>> {
    column_as_strings(df, DATE_COLUMN)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(value) => parse_date(&value),
            None => Err(ForecastError::DataError(format!(
                "Row {} has no {}",
                row, DATE_COLUMN
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 8, d).unwrap()
    }

    fn sample_frame() -> DataFrame {
        df!(
            COUNTRY_COLUMN => &["Italy", "Italy", "Italy", "Brazil"],
            REGION_COLUMN => &[None, None, Some("Lazio"), None::<&str>],
            DATE_COLUMN => &["2020-08-01", "2020-08-02", "2020-08-01", "2020-08-01"],
            NEW_CASES_COLUMN => &[Some(10.0), None, Some(3.0), Some(7.0)],
            "C1_School closing" => &[1.0, 2.0, 3.0, 0.0]
        )
        .unwrap()
    }

    #[test]
    fn test_from_dataframe_keys_rows_by_entity_and_date() {
        let df = sample_frame();
        let table = DailyTable::from_dataframe(&df, &[NEW_CASES_COLUMN.to_string()]).unwrap();

        assert_eq!(
            table.entities(),
            &[
                GeoId::country("Italy"),
                GeoId::new("Italy", Some("Lazio")),
                GeoId::country("Brazil"),
            ]
        );
        // The null case row is left out
        assert_eq!(table.len(), 3);
        let italy = table.entity(&GeoId::country("Italy"));
        assert_eq!(italy.at(day(1)), Some(&[10.0][..]));
        assert_eq!(italy.at(day(2)), None);
    }

    #[test]
    fn test_indicator_columns_keep_every_row() {
        let df = sample_frame();
        let table = DailyTable::from_dataframe(&df, &["C1_School closing".to_string()]).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(
            table.entity(&GeoId::country("Italy")).at(day(2)),
            Some(&[2.0][..])
        );
    }

    #[test]
    fn test_missing_column_is_reported() {
        let df = sample_frame();
        let result = DailyTable::from_dataframe(&df, &["MA".to_string()]);
        assert!(matches!(result, Err(ForecastError::DataError(_))));
    }

    #[test]
    fn test_range_is_half_open() {
        let mut table = DailyTable::new(vec!["x".to_string()]);
        let geo = GeoId::country("Italy");
        for d in 1..=5 {
            table.insert(geo.clone(), day(d), vec![d as f64]).unwrap();
        }

        let series = table.entity(&geo);
        let rows: Vec<f64> = series
            .range(day(2), day(4))
            .into_iter()
            .map(|(_, v)| v[0])
            .collect();
        assert_eq!(rows, vec![2.0, 3.0]);
        assert!(series.range(day(4), day(2)).is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicates_and_bad_width() {
        let mut table = DailyTable::new(vec!["x".to_string()]);
        let geo = GeoId::country("Italy");
        table.insert(geo.clone(), day(1), vec![1.0]).unwrap();
        assert!(table.insert(geo.clone(), day(1), vec![2.0]).is_err());
        assert!(table.insert(geo, day(2), vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_unknown_entity_is_empty() {
        let table = DailyTable::new(vec!["x".to_string()]);
        assert!(table.entity(&GeoId::country("Peru")).is_empty());
    }

    #[test]
    fn test_parse_date_accepts_datetime_strings() {
        assert_eq!(parse_date("2020-08-03").unwrap(), day(3));
        assert_eq!(parse_date("2020-08-03 00:00:00").unwrap(), day(3));
        assert!(parse_date("08/03/2020").is_err());
    }
}
