//! # Share Forecast
//!
//! Projects end-of-year album volume for AMG and for the whole market from
//! weekly sales totals, and derives AMG's projected market share.
//!
//! ## Pipeline
//!
//! - Observation tables per [`MetricFamily`], fetched through an [`ObservationProvider`]
//! - A seeded random forest per family, trained on prior years only
//! - Year-end projection = year-to-date + predicted remaining volume
//! - One forecast per week from the latest completed week through week 52
//!
//! ## Quick Start
//!
//! ```no_run
//! use share_forecast::{CsvObservationProvider, ForecastPipeline, PipelineConfig};
//!
//! let provider = CsvObservationProvider::new("data");
//! let pipeline = ForecastPipeline::new(PipelineConfig::new(2025), provider)?;
//!
//! let series = pipeline.run_forecast_series()?;
//! for result in &series {
//!     println!("week {}: {:.4}%", result.week, result.share_percentage);
//! }
//! # Ok::<(), share_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod family;
pub mod forecaster;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod refresh;
pub mod sink;
pub mod trainer;

// Re-export commonly used types
pub use crate::config::{ConfigError, ForecastConfig, PipelineConfig};
pub use crate::data::{Observation, ObservationTable};
pub use crate::error::{ForecastError, Result};
pub use crate::family::{FeatureSchema, MetricFamily};
pub use crate::forecaster::{ForecastResult, Forecaster};
pub use crate::models::forest::{ForestParams, RandomForestRegressor};
pub use crate::pipeline::{ForecastPipeline, ForecastSeries};
pub use crate::provider::{CsvObservationProvider, InMemoryProvider, ObservationProvider};
pub use crate::sink::{CsvForecastSink, ForecastSink};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
