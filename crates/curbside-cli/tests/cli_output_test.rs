//! Integration tests for the `curbside` binary
//!
//! These run the built binary against datasets in a temporary directory and
//! check JSON output, exit status and configuration precedence.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const ZONES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "id": "rpz-12",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [174.77, -41.29],
                    [174.78, -41.29],
                    [174.78, -41.28],
                    [174.77, -41.28],
                    [174.77, -41.29]
                ]]
            },
            "properties": { "zone": "RPZ-12" }
        }
    ]
}"#;

const SIGNS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "id": "sign-1",
            "geometry": { "type": "Point", "coordinates": [174.7762, -41.2865] },
            "properties": { "text": "P120" }
        }
    ]
}"#;

const CATEGORIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]]]
            },
            "properties": { "category": "Bowtie" }
        }
    ]
}"#;

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("zones.geojson"), ZONES).unwrap();
    fs::write(dir.path().join("signs.geojson"), SIGNS).unwrap();
    fs::write(dir.path().join("categories.geojson"), CATEGORIES).unwrap();
    dir
}

fn curbside(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_curbside"));
    command
        .current_dir(dir)
        .args(["--zones", "zones.geojson", "--signs", "signs.geojson"])
        .args(["--categories", "categories.geojson"])
        .args(args)
        .env("RUST_LOG", "warn");

    for key in [
        "CURBSIDE_ZONES",
        "CURBSIDE_SIGNS",
        "CURBSIDE_CATEGORIES",
        "CURBSIDE_CANONICAL_CRS",
        "CURBSIDE_PROJECTED_CRS",
        "CURBSIDE_DEFAULT_RADIUS",
    ] {
        command.env_remove(key);
    }

    command.output().expect("Failed to execute curbside")
}

fn json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

#[test]
fn test_query_json_output() {
    let dir = workspace();
    let output =
        curbside(dir.path(), &["query", "--lat", "-41.2865", "--lon", "174.7762", "--json"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let parsed = json(&output);
    assert_eq!(parsed["status"], "success");

    let data = &parsed["data"];
    assert_eq!(data["radius_meters"], 10.0);
    assert_eq!(data["zones"][0]["id"], "rpz-12");
    assert_eq!(data["zones"][0]["properties"]["zone"], "RPZ-12");
    assert_eq!(data["zones"][0]["type"], "Feature");
    assert_eq!(data["categories"].as_array().map(Vec::len), Some(0));
    assert_eq!(data["signs"][0]["properties"]["text"], "P120");
}

#[test]
fn test_query_single_dataset() {
    let dir = workspace();
    let output = curbside(
        dir.path(),
        &["query", "--lat", "1.0", "--lon", "0.5", "--only", "categories", "--json"],
    );

    assert!(output.status.success());
    let data = &json(&output)["data"];
    assert!(data.get("zones").is_none());
    assert!(data.get("signs").is_none());
    assert_eq!(data["categories"][0]["properties"]["category"], "Bowtie");
}

#[test]
fn test_invalid_latitude_fails() {
    let dir = workspace();
    let output = curbside(dir.path(), &["query", "--lat", "123", "--lon", "0"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("latitude"), "stderr: {}", stderr);
}

#[test]
fn test_missing_dataset_fails() {
    let dir = workspace();
    fs::remove_file(dir.path().join("signs.geojson")).unwrap();
    let output = curbside(dir.path(), &["inspect"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("signs.geojson"), "stderr: {}", stderr);
}

#[test]
fn test_inspect_datasets_reports_repairs() {
    let dir = workspace();
    let output = curbside(dir.path(), &["inspect", "datasets", "--json"]);

    assert!(output.status.success());
    let datasets = json(&output)["data"]["datasets"].as_array().cloned().unwrap();
    assert_eq!(datasets.len(), 3);

    let categories = datasets.iter().find(|d| d["name"] == "categories").unwrap();
    assert_eq!(categories["features"], 1);
    assert_eq!(categories["repaired"], 1);
    assert_eq!(categories["crs"], "EPSG:4326");
}

#[test]
fn test_inspect_config_shows_sources() {
    let dir = workspace();
    fs::write(dir.path().join("custom.toml"), "default_radius_meters = 25.0\n").unwrap();

    let output = curbside(dir.path(), &["inspect", "config", "--config", "custom.toml", "--json"]);

    assert!(output.status.success());
    let values = json(&output)["data"]["values"].as_array().cloned().unwrap();
    let entry = |key: &str| values.iter().find(|v| v["key"] == key).cloned().unwrap();

    assert_eq!(entry("default_radius_meters")["value"], "25");
    assert_eq!(entry("default_radius_meters")["source"], "File");
    assert_eq!(entry("zones_path")["source"], "Cli");
    assert_eq!(entry("projected_crs")["source"], "Default");
}

#[test]
fn test_default_radius_flag_overrides_file() {
    let dir = workspace();
    fs::write(dir.path().join("custom.toml"), "default_radius_meters = 25.0\n").unwrap();

    let args = ["inspect", "config", "--config", "custom.toml", "--default-radius", "40", "--json"];
    let output = curbside(dir.path(), &args);

    assert!(output.status.success());
    let values = json(&output)["data"]["values"].as_array().cloned().unwrap();
    let radius = values.iter().find(|v| v["key"] == "default_radius_meters").unwrap();
    assert_eq!(radius["value"], "40");
    assert_eq!(radius["source"], "Cli");

    // Radius used by a query that gives none
    let query = [
        "query",
        "--lat",
        "-41.2865",
        "--lon",
        "174.7762",
        "--default-radius",
        "3",
        "--json",
    ];
    let output = curbside(dir.path(), &query);
    assert!(output.status.success());
    assert_eq!(json(&output)["data"]["radius_meters"], 3.0);
}

#[test]
fn test_human_output() {
    let dir = workspace();
    let output = curbside(dir.path(), &["query", "--lat", "-41.2865", "--lon", "174.7762"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rpz-12"));
    assert!(stdout.contains("text=P120"));
}
