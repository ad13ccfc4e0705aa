//! Metric families and their feature/target schemas

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of predictor columns per family
pub const FEATURE_COUNT: usize = 8;

/// One row of predictor values, in schema order
pub type FeatureVector = [f64; FEATURE_COUNT];

/// One of the two independent series the forecast is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFamily {
    /// AMG label sales, the numerator of the share
    Amg,
    /// Whole-market sales, the denominator of the share
    Market,
}

/// Column names for one family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    pub period_metric: &'static str,
    pub four_week_sum: &'static str,
    pub four_week_average: &'static str,
    pub eight_week_average: &'static str,
    pub four_week_difference: &'static str,
    pub target: &'static str,
    pub ytd: &'static str,
}

pub const YEAR_COLUMN: &str = "year";
pub const WEEK_COLUMN: &str = "week";
pub const QUARTER_COLUMN: &str = "quarter";

const AMG_SCHEMA: FeatureSchema = FeatureSchema {
    period_metric: "amg_albums",
    four_week_sum: "four_week_rolling_sum_amg",
    four_week_average: "four_week_amg_rolling_average_albums_moved",
    eight_week_average: "eight_week_amg_rolling_average_albums_moved",
    four_week_difference: "amg_weekly_albums_four_week_difference",
    target: "remaining_amg_albums",
    ytd: "amg_ytd_albums",
};

const MARKET_SCHEMA: FeatureSchema = FeatureSchema {
    period_metric: "market_albums",
    four_week_sum: "four_week_rolling_sum_market",
    four_week_average: "four_week_market_rolling_average_albums_moved",
    eight_week_average: "eight_week_market_rolling_average_albums_moved",
    four_week_difference: "market_weekly_albums_four_week_difference",
    target: "remaining_market_albums",
    ytd: "market_ytd_albums",
};

impl MetricFamily {
    /// Every family, numerator first
    pub const ALL: [MetricFamily; 2] = [MetricFamily::Amg, MetricFamily::Market];

    pub fn label(&self) -> &'static str {
        match self {
            MetricFamily::Amg => "amg",
            MetricFamily::Market => "market",
        }
    }

    pub fn schema(&self) -> &'static FeatureSchema {
        match self {
            MetricFamily::Amg => &AMG_SCHEMA,
            MetricFamily::Market => &MARKET_SCHEMA,
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FeatureSchema {
    /// Predictor columns in model input order
    pub fn predictors(&self) -> [&'static str; FEATURE_COUNT] {
        [
            WEEK_COLUMN,
            YEAR_COLUMN,
            QUARTER_COLUMN,
            self.period_metric,
            self.four_week_sum,
            self.four_week_average,
            self.eight_week_average,
            self.four_week_difference,
        ]
    }

    /// Every column a table for this family must carry
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = self.predictors().to_vec();
        columns.push(self.target);
        columns.push(self.ytd);
        columns
    }
}
