use super::settings::Settings;
use super::{load_config_from, BrokerSettings};

use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.log.level, "info");
    assert_eq!(settings.broker.root_element, "message");
    assert!(settings.broker.isolate_panics);
}

#[test]
#[serial]
fn test_missing_file_yields_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let settings = load_config_from(&tmp.path().join("absent")).expect("load config");
    assert_eq!(settings, Settings::default());
}

#[test]
#[serial]
fn test_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let toml = r#"
        [log]
        level = "debug"

        [broker]
        root_element = "envelope"
        isolate_panics = false
    "#;
    fs::write(tmp.path().join("default.toml"), toml).expect("write config file");

    let settings = load_config_from(&tmp.path().join("default")).expect("load config");
    assert_eq!(settings.log.level, "debug");
    assert_eq!(
        settings.broker,
        BrokerSettings {
            root_element: "envelope".to_string(),
            isolate_panics: false,
        }
    );
}

#[test]
#[serial]
fn test_partial_file_keeps_remaining_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    fs::write(tmp.path().join("default.toml"), "[log]\nlevel = \"warn\"\n")
        .expect("write config file");

    let settings = load_config_from(&tmp.path().join("default")).expect("load config");
    assert_eq!(settings.log.level, "warn");
    assert_eq!(settings.broker, BrokerSettings::default());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let tmp = TempDir::new().expect("create tempdir");
    fs::write(tmp.path().join("default.toml"), "[log]\nlevel = \"warn\"\n")
        .expect("write config file");
    let stem = tmp.path().join("default");

    temp_env::with_vars(
        [
            ("ACKSUB__LOG__LEVEL", Some("trace")),
            ("ACKSUB__BROKER__ROOT_ELEMENT", Some("signal")),
        ],
        || {
            let settings = load_config_from(Path::new(&stem)).expect("load config");
            assert_eq!(settings.log.level, "trace");
            assert_eq!(settings.broker.root_element, "signal");
            assert!(settings.broker.isolate_panics);
        },
    );
}
