//! # Market share forecasting
//!
//! Workspace facade over the two member crates:
//!
//! - [`math`]: rolling weekly aggregates used to build the observation tables
//! - [`forecast`]: training, per-week projection and the year-end forecast series
//!
//! ## Example
//!
//! ```
//! use share_forecast_workspace::forecast::{MetricFamily, PipelineConfig};
//!
//! let config = PipelineConfig::new(2025);
//! assert_eq!(config.family(MetricFamily::Amg).query, "amg_totals");
//! assert_eq!(config.model.n_estimators, 100);
//! ```

pub use share_forecast as forecast;
pub use share_math as math;

/// Release of the forecasting workspace
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_reexports() {
        let mut aggregator = math::WeeklyAggregator::new();
        let summary = aggregator.push(12.0).unwrap();
        assert_eq!(summary.four_week_sum, 12.0);
        assert_eq!(forecast::MetricFamily::ALL.len(), 2);
        assert!(!version().is_empty());
    }
}
