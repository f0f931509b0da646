//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use curbside_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn clear_env() {
    for key in [
        "CURBSIDE_ZONES",
        "CURBSIDE_SIGNS",
        "CURBSIDE_CATEGORIES",
        "CURBSIDE_CANONICAL_CRS",
        "CURBSIDE_PROJECTED_CRS",
        "CURBSIDE_DEFAULT_RADIUS",
    ] {
        env::remove_var(key);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = config_file(
        r#"
zones_path = "file-zones.geojson"
default_radius_meters = 15.0
"#,
    );

    env::set_var("CURBSIDE_ZONES", "env-zones.geojson");

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.zones_path.value, PathBuf::from("env-zones.geojson"));
    assert_eq!(config.zones_path.source, ConfigSource::Environment);
    assert_eq!(config.default_radius_meters.value, 15.0);
    assert_eq!(config.default_radius_meters.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    env::set_var("CURBSIDE_DEFAULT_RADIUS", "20");
    env::set_var("CURBSIDE_PROJECTED_CRS", "EPSG:2193");

    let mut config = LayeredConfig::with_defaults().load_from_env();
    assert_eq!(config.default_radius_meters.value, 20.0);
    assert_eq!(config.projected_crs.value, 2193);

    config.update_from_cli(CliConfigOverrides {
        default_radius_meters: Some(5.0),
        ..Default::default()
    });

    assert_eq!(config.default_radius_meters.value, 5.0);
    assert_eq!(config.default_radius_meters.source, ConfigSource::Cli);
    assert_eq!(config.projected_crs.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_env_values_are_ignored() {
    clear_env();
    env::set_var("CURBSIDE_PROJECTED_CRS", "mercator");
    env::set_var("CURBSIDE_DEFAULT_RADIUS", "-4");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.projected_crs.value, 3857);
    assert_eq!(config.projected_crs.source, ConfigSource::Default);
    assert_eq!(config.default_radius_meters.value, 10.0);
    assert_eq!(config.default_radius_meters.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_file_does_not_override_env() {
    clear_env();
    env::set_var("CURBSIDE_SIGNS", "env-signs.geojson");

    let file = config_file(r#"signs_path = "file-signs.geojson""#);

    // Env applied first, then file: the file must not win
    let config = LayeredConfig::with_defaults()
        .load_from_env()
        .load_from_file(file.path())
        .unwrap();

    assert_eq!(config.signs_path.value, PathBuf::from("env-signs.geojson"));
    assert_eq!(config.signs_path.source, ConfigSource::Environment);

    clear_env();
}

#[test]
fn test_missing_file_is_config_error() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/curbside.toml");
    assert!(result.is_err());
}
