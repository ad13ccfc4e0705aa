//! Forecast series over the rest of the year

use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::forecaster::{ForecastResult, Forecaster};
use crate::provider::ObservationProvider;
use serde::Serialize;
use std::ops::RangeInclusive;
use tracing::info;

/// Last week forecast in a year
pub const FINAL_WEEK: u32 = 52;

/// Weekly forecasts, ascending by week
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ForecastSeries(Vec<ForecastResult>);

impl ForecastSeries {
    pub fn new(mut results: Vec<ForecastResult>) -> Self {
        results.sort_by_key(|result| result.week);
        Self(results)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForecastResult> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ForecastResult] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn weeks(&self) -> Vec<u32> {
        self.0.iter().map(|result| result.week).collect()
    }

    pub fn into_vec(self) -> Vec<ForecastResult> {
        self.0
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ForecastError::InvalidParameter(format!("Cannot serialise series: {}", e)))
    }
}

impl<'a> IntoIterator for &'a ForecastSeries {
    type Item = &'a ForecastResult;
    type IntoIter = std::slice::Iter<'a, ForecastResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Weeks still to forecast once `latest_completed_week` has landed
pub fn pending_weeks(latest_completed_week: u32) -> RangeInclusive<u32> {
    latest_completed_week.saturating_add(1)..=FINAL_WEEK
}

/// Drives one forecast per remaining week
#[derive(Debug)]
pub struct ForecastPipeline<P> {
    config: PipelineConfig,
    provider: P,
}

impl<P: ObservationProvider> ForecastPipeline<P> {
    pub fn new(config: PipelineConfig, provider: P) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, provider })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn forecaster(&self) -> Forecaster<'_, P> {
        Forecaster::new(&self.provider, &self.config)
    }

    /// Forecast every week after the latest completed one through week 52.
    ///
    /// Stops at the first failing week; the error carries that week.
    pub fn run_forecast_series(&self) -> Result<ForecastSeries> {
        let year = self.config.current_year;
        let latest = self
            .provider
            .latest_week(&self.config.latest_week_query, year)?;
        let weeks = pending_weeks(latest);

        info!(year, latest_week = latest, pending = weeks.clone().count(), "starting forecast run");

        let forecaster = self.forecaster();
        let mut results = Vec::with_capacity(weeks.clone().count());
        for week in weeks {
            let result = forecaster.forecast(week).map_err(|source| ForecastError::Week {
                week,
                source: Box::new(source),
            })?;
            info!(
                week,
                share = result.share_percentage,
                amg = result.projected_amg_total,
                market = result.projected_market_total,
                "forecast complete"
            );
            results.push(result);
        }

        Ok(ForecastSeries::new(results))
    }
}
