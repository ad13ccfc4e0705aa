//! Trailing-window statistics
//!
//! A [`RollingWindow`] behaves like a SQL window framed as
//! `ROWS BETWEEN n-1 PRECEDING AND CURRENT ROW`: until `n` values have been
//! pushed, every statistic is taken over the partial window.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Trailing window over the last `period` values
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

/// Snapshot of the aggregates one weekly row carries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingSummary {
    pub four_week_sum: f64,
    pub four_week_average: f64,
    pub eight_week_average: f64,
    pub four_week_difference: f64,
}

impl RollingWindow {
    /// Create a new window holding at most `period` values
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self::with_period(period))
    }

    // callers guarantee `period > 0`
    fn with_period(period: usize) -> Self {
        Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
        }
    }

    /// Push a new value, evicting the oldest once the window is full
    pub fn push(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Window values must be finite, got {}",
                value
            )));
        }

        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }

        Ok(())
    }

    /// Sum of the values currently in the window
    pub fn sum(&self) -> Result<f64> {
        self.ensure_not_empty()?;
        Ok(self.sum)
    }

    /// Mean of the values currently in the window
    pub fn mean(&self) -> Result<f64> {
        self.ensure_not_empty()?;
        Ok(self.sum / self.values.len() as f64)
    }

    /// Newest value minus oldest value in the window
    pub fn difference(&self) -> Result<f64> {
        match (self.values.back(), self.values.front()) {
            (Some(newest), Some(oldest)) => Ok(newest - oldest),
            _ => Err(self.empty_error()),
        }
    }

    /// Number of values currently held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value has been pushed since creation or the last reset
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the window holds `period` values
    pub fn is_full(&self) -> bool {
        self.values.len() == self.period
    }

    /// Get the configured period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Clear all values, e.g. at a year boundary
    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
    }

    fn ensure_not_empty(&self) -> Result<()> {
        if self.values.is_empty() {
            return Err(self.empty_error());
        }
        Ok(())
    }

    fn empty_error(&self) -> MathError {
        MathError::InsufficientData(format!(
            "Window of period {} holds no values",
            self.period
        ))
    }
}

/// Tracks the four windows behind the weekly aggregate columns
#[derive(Debug, Clone)]
pub struct WeeklyAggregator {
    four_week: RollingWindow,
    eight_week: RollingWindow,
    // current week plus the four before it
    lag: RollingWindow,
}

impl WeeklyAggregator {
    pub fn new() -> Self {
        Self {
            four_week: RollingWindow::with_period(4),
            eight_week: RollingWindow::with_period(8),
            lag: RollingWindow::with_period(5),
        }
    }

    /// Record one week's total and return the aggregates for that week
    pub fn push(&mut self, albums: f64) -> Result<RollingSummary> {
        self.four_week.push(albums)?;
        self.eight_week.push(albums)?;
        self.lag.push(albums)?;

        Ok(RollingSummary {
            four_week_sum: self.four_week.sum()?,
            four_week_average: self.four_week.mean()?,
            eight_week_average: self.eight_week.mean()?,
            four_week_difference: self.lag.difference()?,
        })
    }

    /// Start a new year
    pub fn reset(&mut self) {
        self.four_week.reset();
        self.eight_week.reset();
        self.lag.reset();
    }
}

impl Default for WeeklyAggregator {
    fn default() -> Self {
        Self::new()
    }
}
