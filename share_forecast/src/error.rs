//! Error types for the share_forecast crate

use crate::family::MetricFamily;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the share_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Training subset is empty or has missing required fields
    #[error("Insufficient {family} training data: {reason}")]
    DataInsufficient { family: MetricFamily, reason: String },

    /// No usable current-year row at the requested week
    #[error("No {family} observation for week {week} of {year}")]
    MissingObservation {
        family: MetricFamily,
        year: i32,
        week: u32,
    },

    /// The denominator family projected a zero (or non-finite) total
    #[error("Degenerate forecast for week {week}: projected {family} total is {projected}")]
    DegenerateForecast {
        week: u32,
        family: MetricFamily,
        projected: f64,
    },

    /// Failure reported by the tabular data provider
    #[error("Data provider error: {0}")]
    DataProvider(String),

    /// Table does not match the family schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// Error raised while fitting or evaluating a model
    #[error("Model error: {0}")]
    Model(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from windowed aggregate calculations
    #[error("Math error: {0}")]
    Math(#[from] share_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failure while projecting one family, for errors that do not name it
    #[error("{family} projection failed: {source}")]
    Family {
        family: MetricFamily,
        #[source]
        source: Box<ForecastError>,
    },

    /// A single week of a forecast series failed
    #[error("Forecast for week {week} failed: {source}")]
    Week {
        week: u32,
        #[source]
        source: Box<ForecastError>,
    },
}

impl ForecastError {
    /// Family that triggered the error, if any
    pub fn family(&self) -> Option<MetricFamily> {
        match self {
            ForecastError::DataInsufficient { family, .. }
            | ForecastError::MissingObservation { family, .. }
            | ForecastError::DegenerateForecast { family, .. } => Some(*family),
            ForecastError::Family { family, .. } => Some(*family),
            ForecastError::Week { source, .. } => source.family(),
            _ => None,
        }
    }

    /// Tag the error with `family` unless it already names one
    pub fn in_family(self, family: MetricFamily) -> Self {
        if self.family().is_some() {
            return self;
        }
        ForecastError::Family {
            family,
            source: Box::new(self),
        }
    }

    /// Week that triggered the error, if any
    pub fn week(&self) -> Option<u32> {
        match self {
            ForecastError::MissingObservation { week, .. }
            | ForecastError::DegenerateForecast { week, .. }
            | ForecastError::Week { week, .. } => Some(*week),
            ForecastError::Family { source, .. } => source.week(),
            _ => None,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::DataProvider(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::DataProvider(err.to_string())
    }
}
