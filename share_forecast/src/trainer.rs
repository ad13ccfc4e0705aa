//! Per-family model fitting

use crate::data::ObservationTable;
use crate::error::{ForecastError, Result};
use crate::family::{FeatureSchema, FeatureVector};
use crate::models::forest::{ForestParams, RandomForestRegressor, TrainedForest};
use crate::models::ForecastModel;
use tracing::debug;

/// Fit a forest on a training subset.
///
/// Every row must carry all predictors and the target; an empty subset or a
/// missing value is reported as [`ForecastError::DataInsufficient`].
pub fn train(
    subset: &ObservationTable,
    schema: &FeatureSchema,
    params: &ForestParams,
) -> Result<TrainedForest> {
    let family = subset.family();
    if subset.is_empty() {
        return Err(ForecastError::DataInsufficient {
            family,
            reason: "training subset is empty".to_string(),
        });
    }

    let mut features: Vec<FeatureVector> = Vec::with_capacity(subset.len());
    let mut targets = Vec::with_capacity(subset.len());

    for row in subset.rows() {
        let Some(vector) = row.predictors() else {
            let column = row.first_missing_predictor(schema).unwrap_or("predictor");
            return Err(ForecastError::DataInsufficient {
                family,
                reason: format!("'{}' missing in week {} of {}", column, row.week, row.year),
            });
        };
        let Some(target) = row.remaining.filter(|v| v.is_finite()) else {
            return Err(ForecastError::DataInsufficient {
                family,
                reason: format!(
                    "'{}' missing in week {} of {}",
                    schema.target, row.week, row.year
                ),
            });
        };

        features.push(vector);
        targets.push(target);
    }

    let model = RandomForestRegressor::new(params.clone())?;
    debug!(%family, rows = features.len(), model = model.name(), "fitting model");
    model.train(&features, &targets)
}
