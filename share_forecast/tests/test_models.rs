use approx::assert_relative_eq;
use rstest::rstest;
use share_forecast::family::FeatureVector;
use share_forecast::models::forest::{ForestParams, RandomForestRegressor};
use share_forecast::models::{ForecastModel, TrainedForecastModel};
use share_forecast::ForecastError;

fn create_test_data() -> (Vec<FeatureVector>, Vec<f64>) {
    let mut features = Vec::new();
    let mut targets = Vec::new();
    for year in [2022.0, 2023.0, 2024.0] {
        for week in 1..=52 {
            let week = week as f64;
            let albums = 1_000.0 + 15.0 * week + (year - 2022.0) * 40.0;
            features.push([week, year, (week / 13.0).ceil().min(4.0), albums, albums * 4.0, albums, albums, 60.0]);
            targets.push((52.0 - week) * 1_100.0);
        }
    }
    (features, targets)
}

#[test]
fn test_forest_is_deterministic() {
    let (features, targets) = create_test_data();
    let model = RandomForestRegressor::new(ForestParams::default()).unwrap();

    let first = model.train(&features, &targets).unwrap();
    let second = model.train(&features, &targets).unwrap();

    let probe = vec![features[10], features[77], features[140]];
    let a = first.predict(&probe).unwrap();
    let b = second.predict(&probe).unwrap();

    let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a), bits(&b));
    assert_eq!(first.n_trees(), 100);
}

#[test]
fn test_forest_tracks_remaining_volume() {
    let (features, targets) = create_test_data();
    let model = RandomForestRegressor::new(ForestParams::default()).unwrap();
    let trained = model.train(&features, &targets).unwrap();

    let early = trained.predict(&[features[52 + 4]]).unwrap()[0];
    let late = trained.predict(&[features[52 + 45]]).unwrap()[0];

    assert!(early > late);
    // in-sample predictions stay close to the target
    assert!((early - targets[52 + 4]).abs() < 5_000.0);
}

#[test]
fn test_mean_model_without_bootstrap() {
    let (features, targets) = create_test_data();
    let params = ForestParams {
        n_estimators: 5,
        max_depth: Some(0),
        bootstrap: false,
        ..ForestParams::default()
    };
    let trained = RandomForestRegressor::new(params)
        .unwrap()
        .train(&features, &targets)
        .unwrap();

    let expected = targets.iter().sum::<f64>() / targets.len() as f64;
    let predicted = trained.predict(&[features[0]]).unwrap()[0];
    assert_relative_eq!(predicted, expected, epsilon = 1e-9);
}

#[test]
fn test_single_row_forest() {
    let (features, targets) = create_test_data();
    let trained = RandomForestRegressor::new(ForestParams::default())
        .unwrap()
        .train(&features[..1], &targets[..1])
        .unwrap();

    assert_eq!(trained.predict(&[features[30]]).unwrap(), vec![targets[0]]);
}

#[test]
fn test_empty_training_set_rejected() {
    let model = RandomForestRegressor::new(ForestParams::default()).unwrap();
    let result = model.train(&[], &[]);
    assert!(matches!(result, Err(ForecastError::Model(_))));
}

#[test]
fn test_non_finite_training_value_rejected() {
    let (mut features, targets) = create_test_data();
    features[3][4] = f64::NAN;
    let model = RandomForestRegressor::new(ForestParams::default()).unwrap();
    assert!(model.train(&features, &targets).is_err());
}

#[rstest]
#[case(ForestParams { n_estimators: 0, ..ForestParams::default() })]
#[case(ForestParams { min_samples_split: 1, ..ForestParams::default() })]
#[case(ForestParams { min_samples_leaf: 0, ..ForestParams::default() })]
fn test_model_parameter_validation(#[case] params: ForestParams) {
    let result = RandomForestRegressor::new(params);
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}

#[test]
fn test_model_name() {
    let model = RandomForestRegressor::new(ForestParams::default()).unwrap();
    assert_eq!(model.name(), "Random Forest (n_estimators=100)");
}
