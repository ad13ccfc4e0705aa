//! Single-week year-end projection

use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::family::MetricFamily;
use crate::models::TrainedForecastModel;
use crate::provider::ObservationProvider;
use crate::trainer::train;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Year-end projection for one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub week: u32,
    #[serde(rename = "pred_amg_albums")]
    pub projected_amg_total: i64,
    #[serde(rename = "pred_market_albums")]
    pub projected_market_total: i64,
    /// 100 * AMG / market, from the unrounded totals
    #[serde(rename = "pred_amg_market_share_percentage")]
    pub share_percentage: f64,
}

/// Field names in record order
pub const FORECAST_FIELDS: [&str; 4] = [
    "week",
    "pred_amg_albums",
    "pred_market_albums",
    "pred_amg_market_share_percentage",
];

/// One family's projection before rounding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub family: MetricFamily,
    pub ytd: f64,
    pub predicted_remaining: f64,
}

impl Projection {
    /// Year-to-date plus predicted remaining volume
    pub fn total(&self) -> f64 {
        self.ytd + self.predicted_remaining
    }
}

impl ForecastResult {
    /// Combine the two family projections for `week`
    pub fn from_projections(week: u32, amg: Projection, market: Projection) -> Result<Self> {
        let amg_total = amg.total();
        let market_total = market.total();

        if market_total == 0.0 || !market_total.is_finite() {
            return Err(ForecastError::DegenerateForecast {
                week,
                family: MetricFamily::Market,
                projected: market_total,
            });
        }
        if !amg_total.is_finite() {
            return Err(ForecastError::DegenerateForecast {
                week,
                family: MetricFamily::Amg,
                projected: amg_total,
            });
        }

        let share = 100.0 * amg_total / market_total;

        Ok(Self {
            week,
            projected_amg_total: amg_total.round_ties_even() as i64,
            projected_market_total: market_total.round_ties_even() as i64,
            share_percentage: round_to(share, 4),
        })
    }
}

/// Round half to even at `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round_ties_even() / scale
}

/// Trains both family models and projects one target week
#[derive(Debug)]
pub struct Forecaster<'a, P: ?Sized> {
    provider: &'a P,
    config: &'a PipelineConfig,
}

impl<'a, P: ObservationProvider + ?Sized> Forecaster<'a, P> {
    pub fn new(provider: &'a P, config: &'a PipelineConfig) -> Self {
        Self { provider, config }
    }

    /// Project year-end totals and share as of `target_week`
    pub fn forecast(&self, target_week: u32) -> Result<ForecastResult> {
        let amg = self.project(MetricFamily::Amg, target_week)?;
        let market = self.project(MetricFamily::Market, target_week)?;
        ForecastResult::from_projections(target_week, amg, market)
    }

    /// Fetch, train and predict for a single family.
    ///
    /// Errors from the provider or the model come back tagged with `family`.
    pub fn project(&self, family: MetricFamily, target_week: u32) -> Result<Projection> {
        self.project_family(family, target_week)
            .map_err(|e| e.in_family(family))
    }

    fn project_family(&self, family: MetricFamily, target_week: u32) -> Result<Projection> {
        let year = self.config.current_year;
        let schema = family.schema();
        let query = &self.config.family(family).query;

        let table = self
            .provider
            .fetch(family, query, year, Some(target_week))?;

        let model = train(&table.training_subset(year), schema, &self.config.model)?;

        if let Some(max_week) = table.max_week(year) {
            if max_week != target_week {
                warn!(%family, max_week, target_week, "latest current-year row is not the target week");
            }
        }

        let missing = || ForecastError::MissingObservation {
            family,
            year,
            week: target_week,
        };
        let row = table.row_at(year, target_week).ok_or_else(missing)?;
        let features = row.predictors().ok_or_else(missing)?;
        let ytd = row.ytd.filter(|v| v.is_finite()).ok_or_else(missing)?;

        let predicted_remaining = model
            .predict(&[features])?
            .first()
            .copied()
            .ok_or_else(|| ForecastError::Model("Forest returned no prediction".to_string()))?;

        debug!(%family, target_week, ytd, predicted_remaining, "projected year end");

        Ok(Projection {
            family,
            ytd,
            predicted_remaining,
        })
    }
}
