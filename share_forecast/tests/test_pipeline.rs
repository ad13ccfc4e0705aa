mod common;

use common::{mean_config, synthetic_table, CURRENT_YEAR};
use pretty_assertions::assert_eq;
use rstest::rstest;
use share_forecast::pipeline::FINAL_WEEK;
use share_forecast::{
    ForecastError, ForecastPipeline, InMemoryProvider, MetricFamily, ObservationProvider,
    ObservationTable, PipelineConfig,
};

/// Full-year tables, with a separate "completed" table ending at `latest`
fn provider(latest: u32, current_weeks: u32) -> InMemoryProvider {
    InMemoryProvider::new()
        .with_table("amg_totals", synthetic_table(MetricFamily::Amg, current_weeks))
        .with_table("market_totals", synthetic_table(MetricFamily::Market, current_weeks))
        .with_table("completed", synthetic_table(MetricFamily::Amg, latest))
}

fn config() -> PipelineConfig {
    let mut config = mean_config();
    config.latest_week_query = "completed".to_string();
    config
}

#[rstest]
#[case(0)]
#[case(30)]
#[case(48)]
#[case(51)]
fn test_series_is_ascending_without_gaps(#[case] latest: u32) {
    let pipeline = ForecastPipeline::new(config(), provider(latest, 52)).unwrap();
    let series = pipeline.run_forecast_series().unwrap();

    let expected: Vec<u32> = (latest + 1..=FINAL_WEEK).collect();
    assert_eq!(series.weeks(), expected);
    assert!(series.iter().all(|r| r.share_percentage > 0.0 && r.share_percentage < 100.0));
}

#[rstest]
#[case(52)]
#[case(53)]
fn test_nothing_left_to_forecast(#[case] latest: u32) {
    let pipeline = ForecastPipeline::new(config(), provider(latest, 53)).unwrap();
    let series = pipeline.run_forecast_series().unwrap();
    assert!(series.is_empty());
}

#[test]
fn test_first_failure_aborts_the_series() {
    // rows stop at week 50, so week 51 cannot be forecast
    let pipeline = ForecastPipeline::new(config(), provider(48, 50)).unwrap();
    let err = pipeline.run_forecast_series().unwrap_err();

    assert_eq!(err.week(), Some(51));
    assert_eq!(err.family(), Some(MetricFamily::Amg));
    match &err {
        ForecastError::Week { week, source } => {
            assert_eq!(*week, 51);
            assert!(matches!(**source, ForecastError::MissingObservation { week: 51, .. }));
        }
        other => panic!("Expected Week error, got {:?}", other),
    }

    let message = err.to_string();
    assert!(message.contains("week 51"));
    assert!(message.contains("amg"));
}

/// Fails every fetch, like a warehouse timeout
struct UnreachableWarehouse;

impl ObservationProvider for UnreachableWarehouse {
    fn fetch(
        &self,
        _family: MetricFamily,
        _query: &str,
        _current_year: i32,
        _upper_bound_week: Option<u32>,
    ) -> share_forecast::Result<ObservationTable> {
        Err(ForecastError::DataProvider("statement timed out".to_string()))
    }

    fn latest_week(&self, _query: &str, _year: i32) -> share_forecast::Result<u32> {
        Ok(50)
    }
}

#[test]
fn test_provider_error_keeps_its_cause() {
    let pipeline = ForecastPipeline::new(config(), UnreachableWarehouse).unwrap();
    let err = pipeline.run_forecast_series().unwrap_err();

    assert_eq!(err.family(), Some(MetricFamily::Amg));
    match err {
        ForecastError::Week { week, source } => {
            assert_eq!(week, 51);
            match *source {
                ForecastError::Family { family, source } => {
                    assert_eq!(family, MetricFamily::Amg);
                    assert!(matches!(*source, ForecastError::DataProvider(ref msg) if msg == "statement timed out"));
                }
                other => panic!("Expected Family error, got {:?}", other),
            }
        }
        other => panic!("Expected Week error, got {:?}", other),
    }
}

#[test]
fn test_market_provider_failure_names_market() {
    // the market query was never registered
    let provider = InMemoryProvider::new()
        .with_table("amg_totals", synthetic_table(MetricFamily::Amg, 52))
        .with_table("completed", synthetic_table(MetricFamily::Amg, 50));
    let pipeline = ForecastPipeline::new(config(), provider).unwrap();

    let err = pipeline.run_forecast_series().unwrap_err();

    assert_eq!(err.week(), Some(51));
    assert_eq!(err.family(), Some(MetricFamily::Market));
    let message = err.to_string();
    assert!(message.contains("week 51"));
    assert!(message.contains("market projection failed"));
    assert!(message.contains("Unknown query 'market_totals'"));
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = config();
    config.model.n_estimators = 0;
    assert!(ForecastPipeline::new(config, provider(48, 52)).is_err());

    let mut config = PipelineConfig::new(CURRENT_YEAR);
    config.amg.query = " ".to_string();
    assert!(matches!(
        ForecastPipeline::new(config, provider(48, 52)),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_unknown_query_is_provider_error() {
    let mut config = config();
    config.market.query = "missing".to_string();
    let pipeline = ForecastPipeline::new(config, provider(50, 52)).unwrap();

    let err = pipeline.run_forecast_series().unwrap_err();
    assert!(matches!(
        err,
        ForecastError::Week { source, .. } if matches!(
            *source,
            ForecastError::Family { family: MetricFamily::Market, ref source }
                if matches!(**source, ForecastError::DataProvider(_))
        )
    ));
}
