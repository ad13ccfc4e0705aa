//! Weekly observation tables
//!
//! The warehouse hands back loosely typed frames. Everything is checked and
//! converted to [`Observation`] records here, once, so the rest of the
//! pipeline works with named fields instead of column lookups.

use crate::error::{ForecastError, Result};
use crate::family::{
    FeatureSchema, FeatureVector, MetricFamily, FEATURE_COUNT, QUARTER_COLUMN, WEEK_COLUMN,
    YEAR_COLUMN,
};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

/// One week of one family
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub year: i32,
    pub week: u32,
    pub quarter: Option<f64>,
    /// Albums moved this week
    pub albums: Option<f64>,
    pub four_week_rolling_sum: Option<f64>,
    pub four_week_rolling_average: Option<f64>,
    pub eight_week_rolling_average: Option<f64>,
    pub four_week_difference: Option<f64>,
    /// Albums sold after this week through year end
    pub remaining: Option<f64>,
    /// Albums sold from the start of the year through this week
    pub ytd: Option<f64>,
}

impl Observation {
    /// Predictor values in schema order, `None` where a value is missing
    pub fn predictor_values(&self) -> [Option<f64>; FEATURE_COUNT] {
        [
            Some(self.week as f64),
            Some(self.year as f64),
            self.quarter,
            self.albums,
            self.four_week_rolling_sum,
            self.four_week_rolling_average,
            self.eight_week_rolling_average,
            self.four_week_difference,
        ]
    }

    /// Complete predictor vector, or `None` if any predictor is missing
    pub fn predictors(&self) -> Option<FeatureVector> {
        let values = self.predictor_values();
        let mut vector = [0.0; FEATURE_COUNT];
        for (slot, value) in vector.iter_mut().zip(values) {
            *slot = value.filter(|v| v.is_finite())?;
        }
        Some(vector)
    }

    /// Name of the first missing predictor, if any
    pub fn first_missing_predictor(&self, schema: &FeatureSchema) -> Option<&'static str> {
        self.predictor_values()
            .into_iter()
            .zip(schema.predictors())
            .find(|(value, _)| !matches!(value, Some(v) if v.is_finite()))
            .map(|(_, name)| name)
    }
}

/// Ordered-by-(year, week) observations of a single family
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    family: MetricFamily,
    rows: Vec<Observation>,
}

impl ObservationTable {
    /// Build a table, sorting rows and rejecting duplicate weeks
    pub fn new(family: MetricFamily, mut rows: Vec<Observation>) -> Result<Self> {
        rows.sort_by_key(|row| (row.year, row.week));

        if let Some(pair) = rows
            .windows(2)
            .find(|pair| (pair[0].year, pair[0].week) == (pair[1].year, pair[1].week))
        {
            return Err(ForecastError::Schema(format!(
                "Duplicate {} observation for week {} of {}",
                family, pair[0].week, pair[0].year
            )));
        }

        Ok(Self { family, rows })
    }

    /// Load a family table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(family: MetricFamily, path: P) -> Result<Self> {
        let df = read_csv_frame(path)?;
        Self::from_dataframe(family, &df)
    }

    /// Convert a frame to typed rows, validating the family schema
    pub fn from_dataframe(family: MetricFamily, df: &DataFrame) -> Result<Self> {
        let mut df = df.clone();
        normalize_column_names(&mut df)?;

        let schema = family.schema();
        let years = key_column(&df, YEAR_COLUMN)?;
        let weeks = key_column(&df, WEEK_COLUMN)?;
        let quarter = value_column(&df, QUARTER_COLUMN)?;
        let albums = value_column(&df, schema.period_metric)?;
        let four_week_sum = value_column(&df, schema.four_week_sum)?;
        let four_week_average = value_column(&df, schema.four_week_average)?;
        let eight_week_average = value_column(&df, schema.eight_week_average)?;
        let four_week_difference = value_column(&df, schema.four_week_difference)?;
        let remaining = value_column(&df, schema.target)?;
        let ytd = value_column(&df, schema.ytd)?;

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let year = i32::try_from(years[i]).map_err(|_| {
                ForecastError::Schema(format!("Year {} out of range", years[i]))
            })?;
            let week = u32::try_from(weeks[i]).map_err(|_| {
                ForecastError::Schema(format!("Week {} out of range", weeks[i]))
            })?;

            rows.push(Observation {
                year,
                week,
                quarter: quarter[i],
                albums: albums[i],
                four_week_rolling_sum: four_week_sum[i],
                four_week_rolling_average: four_week_average[i],
                eight_week_rolling_average: eight_week_average[i],
                four_week_difference: four_week_difference[i],
                remaining: remaining[i],
                ytd: ytd[i],
            });
        }

        Self::new(family, rows)
    }

    pub fn family(&self) -> MetricFamily {
        self.family
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows strictly before `current_year`
    pub fn training_subset(&self, current_year: i32) -> ObservationTable {
        ObservationTable {
            family: self.family,
            rows: self
                .rows
                .iter()
                .filter(|row| row.year < current_year)
                .cloned()
                .collect(),
        }
    }

    /// Rows of a single year
    pub fn year_rows(&self, year: i32) -> impl Iterator<Item = &Observation> {
        self.rows.iter().filter(move |row| row.year == year)
    }

    /// Row at exactly `week` of `year`
    pub fn row_at(&self, year: i32, week: u32) -> Option<&Observation> {
        self.rows
            .binary_search_by_key(&(year, week), |row| (row.year, row.week))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Highest week present for `year`
    pub fn max_week(&self, year: i32) -> Option<u32> {
        self.year_rows(year).map(|row| row.week).max()
    }

    /// Every prior year in full plus `current_year` rows up to `upper_bound_week`.
    /// Rows after `current_year` are dropped.
    pub fn bounded(&self, current_year: i32, upper_bound_week: Option<u32>) -> ObservationTable {
        ObservationTable {
            family: self.family,
            rows: self
                .rows
                .iter()
                .filter(|row| {
                    row.year < current_year
                        || (row.year == current_year
                            && upper_bound_week.map_or(true, |bound| row.week <= bound))
                })
                .cloned()
                .collect(),
        }
    }
}

/// Read a CSV file into a frame with lower-cased column names
pub(crate) fn read_csv_frame<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        ForecastError::DataProvider(format!("Cannot open {}: {}", path.display(), e))
    })?;
    let mut df = CsvReader::new(file)
        .infer_schema(None)
        .has_header(true)
        .finish()?;
    normalize_column_names(&mut df)?;
    Ok(df)
}

/// Lower-case and trim column names; the warehouse returns them upper-cased
pub(crate) fn normalize_column_names(df: &mut DataFrame) -> Result<()> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim().to_lowercase())
        .collect();

    let mut seen = HashSet::new();
    if let Some(dup) = names.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(ForecastError::Schema(format!(
            "Column '{}' appears more than once",
            dup
        )));
    }

    df.set_column_names(&names)?;
    Ok(())
}

/// Numeric column as nullable f64 values
pub(crate) fn value_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)
        .map_err(|_| ForecastError::Schema(format!("Missing column '{}'", name)))?;

    // an all-empty column is inferred as text
    let all_null = series.null_count() == series.len();
    if !series.dtype().is_numeric() && !all_null {
        return Err(ForecastError::Schema(format!(
            "Column '{}' is {} but must be numeric",
            name,
            series.dtype()
        )));
    }

    let values = series.cast(&DataType::Float64)?;
    let values = values.f64()?;
    Ok(values.into_iter().collect())
}

/// Integer key column; nulls and fractional values are rejected
pub(crate) fn key_column(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    value_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            Some(v) if v.fract() == 0.0 && v.is_finite() => Ok(v as i64),
            Some(v) => Err(ForecastError::Schema(format!(
                "Column '{}' row {} holds non-integer {}",
                name, i, v
            ))),
            None => Err(ForecastError::Schema(format!(
                "Column '{}' row {} is empty",
                name, i
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column_names() {
        let mut df = DataFrame::new(vec![
            Series::new("YEAR", &[2024i64]),
            Series::new(" Week ", &[3i64]),
        ])
        .unwrap();
        normalize_column_names(&mut df).unwrap();
        assert_eq!(df.get_column_names(), vec!["year", "week"]);
    }

    #[test]
    fn test_normalize_rejects_case_duplicates() {
        let mut df = DataFrame::new(vec![
            Series::new("week", &[1i64]),
            Series::new("WEEK", &[1i64]),
        ])
        .unwrap();
        assert!(normalize_column_names(&mut df).is_err());
    }

    #[test]
    fn test_key_column_rejects_fractions() {
        let df = DataFrame::new(vec![Series::new("week", &[1.5f64])]).unwrap();
        assert!(matches!(
            key_column(&df, "week"),
            Err(ForecastError::Schema(_))
        ));
    }
}
