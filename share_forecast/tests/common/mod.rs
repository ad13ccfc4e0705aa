#![allow(dead_code)]

use share_forecast::models::forest::ForestParams;
use share_forecast::refresh::{build_table, quarter_of_week, WeeklyTotals};
use share_forecast::{MetricFamily, Observation, ObservationTable, PipelineConfig};

pub const CURRENT_YEAR: i32 = 2025;

/// Observation with flat rolling aggregates
pub fn observation(year: i32, week: u32, albums: f64, remaining: Option<f64>, ytd: f64) -> Observation {
    Observation {
        year,
        week,
        quarter: Some(quarter_of_week(week) as f64),
        albums: Some(albums),
        four_week_rolling_sum: Some(albums * 4.0),
        four_week_rolling_average: Some(albums),
        eight_week_rolling_average: Some(albums),
        four_week_difference: Some(0.0),
        remaining,
        ytd: Some(ytd),
    }
}

pub fn table(family: MetricFamily, rows: Vec<Observation>) -> ObservationTable {
    ObservationTable::new(family, rows).unwrap()
}

/// Every tree is a single leaf over all rows: the forest predicts the training mean
pub fn mean_params() -> ForestParams {
    ForestParams {
        n_estimators: 10,
        max_depth: Some(0),
        bootstrap: false,
        ..ForestParams::default()
    }
}

pub fn mean_config() -> PipelineConfig {
    let mut config = PipelineConfig::new(CURRENT_YEAR);
    config.model = mean_params();
    config
}

/// Deterministic weekly totals for 2021 through 2024 plus 2025 up to `current_weeks`
pub fn synthetic_totals(current_weeks: u32) -> Vec<WeeklyTotals> {
    let mut totals = Vec::new();
    for year in 2021..=CURRENT_YEAR {
        let weeks = if year == CURRENT_YEAR { current_weeks } else { 52 };
        for week in 1..=weeks {
            let amg = 1_000.0 + 10.0 * week as f64 + 50.0 * (year - 2021) as f64 + (week % 5) as f64 * 7.0;
            totals.push(WeeklyTotals {
                year,
                week,
                amg_albums: amg,
                market_albums: amg * 4.0 + 300.0,
                complete: true,
            });
        }
    }
    totals
}

pub fn synthetic_table(family: MetricFamily, current_weeks: u32) -> ObservationTable {
    build_table(family, &synthetic_totals(current_weeks), CURRENT_YEAR).unwrap()
}

/// Full synthetic years where current-year weeks after `completed` are still building
pub fn building_totals(completed: u32) -> Vec<WeeklyTotals> {
    let mut totals = synthetic_totals(52);
    for t in totals.iter_mut().filter(|t| t.year == CURRENT_YEAR && t.week > completed) {
        t.complete = false;
    }
    totals
}

/// Raw totals CSV with upper-cased headers and the `complete` flag
pub fn write_totals_csv(path: &std::path::Path, totals: &[WeeklyTotals]) {
    use std::io::Write;

    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "YEAR,WEEK,AMG_ALBUMS,MARKET_ALBUMS,COMPLETE").unwrap();
    for t in totals {
        writeln!(
            file,
            "{},{},{},{},{}",
            t.year, t.week, t.amg_albums, t.market_albums, t.complete
        )
        .unwrap();
    }
}
