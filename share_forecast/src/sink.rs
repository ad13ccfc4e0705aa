//! Forecast table output

use crate::error::Result;
use crate::forecaster::FORECAST_FIELDS;
use crate::pipeline::ForecastSeries;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Destination for a finished forecast series
pub trait ForecastSink {
    /// Replace the destination's contents with `series`, returning rows written
    fn write(&mut self, series: &ForecastSeries) -> Result<usize>;
}

/// Truncate-and-load CSV table with upper-cased column names
#[derive(Debug, Clone)]
pub struct CsvForecastSink {
    path: PathBuf,
}

impl CsvForecastSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column names as written to the table
    pub fn header() -> Vec<String> {
        FORECAST_FIELDS.iter().map(|f| f.to_uppercase()).collect()
    }
}

impl ForecastSink for CsvForecastSink {
    fn write(&mut self, series: &ForecastSeries) -> Result<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer.write_record(Self::header())?;
        for result in series {
            writer.serialize(result)?;
        }
        writer.flush()?;

        info!(rows = series.len(), path = %self.path.display(), "loaded forecast table");
        Ok(series.len())
    }
}
