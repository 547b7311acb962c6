//! Configuration file round trips.

use forest_lower::*;
use std::fs;
use tempfile::TempDir;

fn custom_config() -> Config {
    ConfigBuilder::new()
        .verbosity(VerbosityLevel::Warning)
        .max_refine_iterations(4)
        .validate_forest(false)
        .equivalence_tolerance(1e-6)
        .num_threads(2)
        .build()
        .unwrap()
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forest_lower.json");

    let config = custom_config();
    config.save_to_file(&path).unwrap();
    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(forest_lower::config::DEFAULT_CONFIG_FILE);

    let config = custom_config();
    config.save_to_file(&path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("max_refine_iterations = 4"));

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forest_lower.yaml");

    let err = Config::default().save_to_file(&path).unwrap_err();
    assert!(matches!(err, ForestError::Config { .. }));

    fs::write(&path, "max_refine_iterations: 3").unwrap();
    assert!(Config::load_from_file(&path).is_err());
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forest_lower.toml");
    fs::write(&path, "max_refine_iterations = 0\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, ForestError::InvalidParameter { .. }));
}

#[test]
fn test_malformed_file_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forest_lower.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        Config::load_from_file(&path).unwrap_err(),
        ForestError::Config { .. }
    ));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    assert!(Config::load_from_file(dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_loaded_config_drives_lowering() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forest_lower.toml");
    fs::write(&path, "max_refine_iterations = 2\nvalidate_forest = true\n").unwrap();
    let config = Config::load_from_file(&path).unwrap();

    let mut forest = SimpleForest::new();
    forest
        .split(SplitAction::root(
            SingleFeatureThreshold::new(0, 0.0),
            [ConstantPredictor::new(-1.0), ConstantPredictor::new(1.0)],
        ))
        .unwrap();
    let model = build_forest_model(forest, 1).unwrap();
    let lowered = lower_forest_model(&model, &config).unwrap();
    assert_eq!(lowered.count_nodes("Forest"), 0);
    assert_eq!(
        lowered.compute_output(&[0.5], OUTPUT_PORT_NAME).unwrap(),
        vec![Value::Real(1.0)]
    );
}
