//! Integration tests for configuration loading and startup validation

use footprints::{ConfigError, ConfigLoader, Footprints, FootprintsError, PipelineOptions};
use tempfile::TempDir;

#[test]
fn test_project_files_layer_by_environment() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("footprints.toml"),
        r#"
endpoint_url = "https://collector.test/events"
interval_wait_ms = 500
max_in_flight = 2
"#,
    )
    .unwrap();

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config.endpoint_url.as_deref(), Some("https://collector.test/events"));
    assert_eq!(config.interval_wait_ms, 500);
    assert_eq!(config.max_in_flight, 2);
    assert!(config.validate().is_ok());
}

#[test]
fn test_json_file_is_accepted() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("footprints.json");
    std::fs::write(
        &path,
        r#"{
            "endpoint_url": "http://localhost:8080/e",
            "debug": true,
            "headers": { "x-site": "shop" }
        }"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert!(config.debug);
    assert_eq!(config.headers["x-site"], "shop");
}

#[tokio::test]
async fn test_invalid_configuration_refuses_to_start() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    std::fs::write(&path, "endpoint_url = \"not a url\"\nmax_in_flight = 0\n").unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let footprints = Footprints::new();
    match footprints.init(config, PipelineOptions::default()) {
        Err(FootprintsError::Config(ConfigError::Invalid(problems))) => {
            assert_eq!(problems.len(), 2, "{problems:?}");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(!footprints.is_initialized());
}

#[tokio::test]
async fn test_failed_init_can_be_retried() {
    let footprints = Footprints::new();
    footprints.page_view(None, None);
    assert!(footprints
        .init(Default::default(), PipelineOptions::default())
        .is_err());

    let mut config = footprints::FootprintsConfig::with_endpoint("http://127.0.0.1:9/e");
    config.max_attempts = Some(1);
    footprints.init(config, PipelineOptions::default()).unwrap();
    assert!(footprints.is_initialized());
    footprints.shutdown();
}
