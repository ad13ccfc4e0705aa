//! Data provider boundary
//!
//! The warehouse side of the pipeline: bounded fetches of family tables and
//! the latest completed week. Connection handling and the SQL behind each
//! query live on the far side of this trait.

use crate::data::{key_column, read_csv_frame, ObservationTable};
use crate::error::{ForecastError, Result};
use crate::family::{MetricFamily, WEEK_COLUMN, YEAR_COLUMN};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of weekly observation tables
pub trait ObservationProvider {
    /// Every row before `current_year`, plus `current_year` rows up to and
    /// including `upper_bound_week` (all of them when `None`)
    fn fetch(
        &self,
        family: MetricFamily,
        query: &str,
        current_year: i32,
        upper_bound_week: Option<u32>,
    ) -> Result<ObservationTable>;

    /// Highest week of `year` present in the query's table, 0 when the year
    /// has no rows. Point it at a table of completed weeks.
    fn latest_week(&self, query: &str, year: i32) -> Result<u32>;
}

/// Reads `<data_dir>/<query>.csv` for each query
#[derive(Debug, Clone)]
pub struct CsvObservationProvider {
    data_dir: PathBuf,
}

impl CsvObservationProvider {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, query: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", query))
    }
}

impl ObservationProvider for CsvObservationProvider {
    fn fetch(
        &self,
        family: MetricFamily,
        query: &str,
        current_year: i32,
        upper_bound_week: Option<u32>,
    ) -> Result<ObservationTable> {
        let path = self.path_for(query);
        let df = read_csv_frame(&path)?;

        let current = col(YEAR_COLUMN).eq(lit(current_year as i64));
        let current = match upper_bound_week {
            Some(bound) => current.and(col(WEEK_COLUMN).lt_eq(lit(bound as i64))),
            None => current,
        };
        let df = df
            .lazy()
            .filter(col(YEAR_COLUMN).lt(lit(current_year as i64)).or(current))
            .collect()?;

        debug!(%family, path = %path.display(), rows = df.height(), "fetched table");
        ObservationTable::from_dataframe(family, &df)
    }

    fn latest_week(&self, query: &str, year: i32) -> Result<u32> {
        let df = read_csv_frame(self.path_for(query))?;
        let years = key_column(&df, YEAR_COLUMN)?;
        let weeks = key_column(&df, WEEK_COLUMN)?;

        let latest = years
            .iter()
            .zip(&weeks)
            .filter(|(y, _)| **y == year as i64)
            .map(|(_, w)| *w)
            .max()
            .unwrap_or(0);

        u32::try_from(latest)
            .map_err(|_| ForecastError::DataProvider(format!("Week {} out of range", latest)))
    }
}

/// Tables held in memory, keyed by query name
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    tables: HashMap<String, ObservationTable>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under a query name, replacing any previous one
    pub fn insert(&mut self, query: impl Into<String>, table: ObservationTable) {
        self.tables.insert(query.into(), table);
    }

    pub fn with_table(mut self, query: impl Into<String>, table: ObservationTable) -> Self {
        self.insert(query, table);
        self
    }

    fn table(&self, query: &str) -> Result<&ObservationTable> {
        self.tables
            .get(query)
            .ok_or_else(|| ForecastError::DataProvider(format!("Unknown query '{}'", query)))
    }
}

impl ObservationProvider for InMemoryProvider {
    fn fetch(
        &self,
        family: MetricFamily,
        query: &str,
        current_year: i32,
        upper_bound_week: Option<u32>,
    ) -> Result<ObservationTable> {
        let table = self.table(query)?;
        if table.family() != family {
            return Err(ForecastError::Schema(format!(
                "Query '{}' holds {} rows, expected {}",
                query,
                table.family(),
                family
            )));
        }
        Ok(table.bounded(current_year, upper_bound_week))
    }

    fn latest_week(&self, query: &str, year: i32) -> Result<u32> {
        Ok(self.table(query)?.max_week(year).unwrap_or(0))
    }
}
