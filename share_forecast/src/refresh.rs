//! Aggregate table refresh
//!
//! Rebuilds both family tables from raw weekly totals. This is the step that
//! has to run before a forecast; the pipeline itself never calls it.

use crate::config::PipelineConfig;
use crate::data::{Observation, ObservationTable};
use crate::error::{ForecastError, Result};
use crate::family::{MetricFamily, WEEK_COLUMN, YEAR_COLUMN};
use serde::{Deserialize, Serialize};
use share_math::WeeklyAggregator;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Weeks per quarter in a 52-week sales year
const WEEKS_PER_QUARTER: u32 = 13;

/// Raw albums moved in one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTotals {
    pub year: i32,
    pub week: u32,
    pub amg_albums: f64,
    pub market_albums: f64,
    /// False while the week's chart is still building; such weeks are
    /// forecast but never reported as completed
    #[serde(default = "default_complete")]
    pub complete: bool,
}

fn default_complete() -> bool {
    true
}

impl WeeklyTotals {
    pub fn albums(&self, family: MetricFamily) -> f64 {
        match family {
            MetricFamily::Amg => self.amg_albums,
            MetricFamily::Market => self.market_albums,
        }
    }
}

/// Quarter a week falls in; week 53 stays in Q4
pub fn quarter_of_week(week: u32) -> u32 {
    ((week.max(1) - 1) / WEEKS_PER_QUARTER + 1).min(4)
}

/// Read raw totals from a CSV with `year, week, amg_albums, market_albums` and an
/// optional `complete` column
pub fn read_weekly_totals<P: AsRef<Path>>(path: P) -> Result<Vec<WeeklyTotals>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let headers: csv::StringRecord = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    reader.set_headers(headers);

    let mut totals = Vec::new();
    for record in reader.deserialize() {
        totals.push(record?);
    }
    Ok(totals)
}

/// Derive one family's observation table.
///
/// Years before `current_year` are complete, so their rows get a `remaining`
/// value; the current year's rows leave it empty.
pub fn build_table(
    family: MetricFamily,
    totals: &[WeeklyTotals],
    current_year: i32,
) -> Result<ObservationTable> {
    let mut sorted = totals.to_vec();
    sorted.sort_by_key(|t| (t.year, t.week));

    if let Some(bad) = sorted.iter().find(|t| t.week == 0 || t.week > 53) {
        return Err(ForecastError::InvalidParameter(format!(
            "Week {} of {} is outside 1..=53",
            bad.week, bad.year
        )));
    }

    let mut year_totals: BTreeMap<i32, f64> = BTreeMap::new();
    for t in &sorted {
        *year_totals.entry(t.year).or_default() += t.albums(family);
    }

    let mut aggregator = WeeklyAggregator::new();
    let mut year = None;
    let mut ytd = 0.0;
    let mut rows = Vec::with_capacity(sorted.len());

    for t in &sorted {
        if year != Some(t.year) {
            aggregator.reset();
            ytd = 0.0;
            year = Some(t.year);
        }

        let albums = t.albums(family);
        let summary = aggregator.push(albums)?;
        ytd += albums;

        let remaining = (t.year < current_year)
            .then(|| year_totals.get(&t.year).map(|total| total - ytd))
            .flatten();

        rows.push(Observation {
            year: t.year,
            week: t.week,
            quarter: Some(quarter_of_week(t.week) as f64),
            albums: Some(albums),
            four_week_rolling_sum: Some(summary.four_week_sum),
            four_week_rolling_average: Some(summary.four_week_average),
            eight_week_rolling_average: Some(summary.eight_week_average),
            four_week_difference: Some(summary.four_week_difference),
            remaining,
            ytd: Some(ytd),
        });
    }

    ObservationTable::new(family, rows)
}

/// Write a table with the family's column names; missing values are empty
pub fn write_table<P: AsRef<Path>>(table: &ObservationTable, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let schema = table.family().schema();
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(schema.columns())?;

    let cell = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    for row in table.rows() {
        let mut record = vec![row.week.to_string(), row.year.to_string()];
        record.extend(row.predictor_values()[2..].iter().map(|v| cell(*v)));
        record.push(cell(row.remaining));
        record.push(cell(row.ytd));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// `(year, week)` of every completed week, ascending
pub fn completed_weeks(totals: &[WeeklyTotals]) -> Vec<(i32, u32)> {
    let mut weeks: Vec<(i32, u32)> = totals
        .iter()
        .filter(|t| t.complete)
        .map(|t| (t.year, t.week))
        .collect();
    weeks.sort_unstable();
    weeks.dedup();
    weeks
}

/// Write the completed-weeks table read by the latest-week lookup
pub fn write_completed_weeks<P: AsRef<Path>>(weeks: &[(i32, u32)], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([YEAR_COLUMN, WEEK_COLUMN])?;
    for (year, week) in weeks {
        writer.write_record(&[year.to_string(), week.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Rebuild both family tables from `input` into `data_dir`, named after each
/// family's query, plus the completed-weeks table named after
/// `latest_week_query`. Returns the family rows written.
pub fn refresh<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    data_dir: Q,
    config: &PipelineConfig,
) -> Result<usize> {
    let totals = read_weekly_totals(input)?;
    let mut written = 0;

    let completed = completed_weeks(&totals);
    let path = data_dir
        .as_ref()
        .join(format!("{}.csv", config.latest_week_query));
    write_completed_weeks(&completed, &path)?;
    info!(weeks = completed.len(), path = %path.display(), "refreshed completed weeks");

    for family in MetricFamily::ALL {
        let table = build_table(family, &totals, config.current_year)?;
        let path = data_dir
            .as_ref()
            .join(format!("{}.csv", config.family(family).query));
        write_table(&table, &path)?;
        info!(%family, rows = table.len(), path = %path.display(), "refreshed table");
        written += table.len();
    }

    Ok(written)
}
