//! # Share Math
//!
//! Windowed statistics over weekly sales totals.
//! The aggregate tables consumed by the forecaster carry trailing sums,
//! averages and differences of weekly album counts; this crate computes them.

use thiserror::Error;

pub mod rolling;

pub use rolling::{RollingSummary, RollingWindow, WeeklyAggregator};

/// Errors that can occur in windowed calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for windowed math operations
pub type Result<T> = std::result::Result<T, MathError>;
