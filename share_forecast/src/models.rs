//! Regression models for remaining-year volume

use crate::error::Result;
use crate::family::FeatureVector;
use std::fmt::Debug;

/// Fitted model, used once per forecast and then dropped
pub trait TrainedForecastModel: Debug {
    /// Predict one value per input row
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Model configuration that can be fitted to a feature matrix
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Fit on `features`, one target value per row
    fn train(&self, features: &[FeatureVector], targets: &[f64]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod forest;
