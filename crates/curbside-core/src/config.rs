use crate::error::{CurbsideError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Default radius for proximity searches, in meters
pub const DEFAULT_RADIUS_METERS: f64 = 10.0;

/// Layered configuration for the lookup engine
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub zones_path: ConfigValue<PathBuf>,
    pub signs_path: ConfigValue<PathBuf>,
    pub categories_path: ConfigValue<PathBuf>,
    pub canonical_crs: ConfigValue<u32>,
    pub projected_crs: ConfigValue<u32>,
    pub default_radius_meters: ConfigValue<f64>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            zones_path: ConfigValue::new(
                PathBuf::from("data/rpz_areas_4326.geojson"),
                ConfigSource::Default,
            ),
            signs_path: ConfigValue::new(
                PathBuf::from("data/parking_signs_4326.geojson"),
                ConfigSource::Default,
            ),
            categories_path: ConfigValue::new(
                PathBuf::from("data/parking_categories_4326.geojson"),
                ConfigSource::Default,
            ),
            canonical_crs: ConfigValue::new(4326, ConfigSource::Default),
            projected_crs: ConfigValue::new(3857, ConfigSource::Default),
            default_radius_meters: ConfigValue::new(DEFAULT_RADIUS_METERS, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| CurbsideError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| CurbsideError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(radius) = file_config.default_radius_meters {
            validate_radius(radius)?;
            self.default_radius_meters.update(radius, ConfigSource::File);
        }

        if let Some(path) = file_config.zones_path {
            self.zones_path.update(path, ConfigSource::File);
        }

        if let Some(path) = file_config.signs_path {
            self.signs_path.update(path, ConfigSource::File);
        }

        if let Some(path) = file_config.categories_path {
            self.categories_path.update(path, ConfigSource::File);
        }

        if let Some(crs) = file_config.canonical_crs {
            self.canonical_crs.update(crs, ConfigSource::File);
        }

        if let Some(crs) = file_config.projected_crs {
            self.projected_crs.update(crs, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Ok(path) = env::var("CURBSIDE_ZONES") {
            self.zones_path.update(PathBuf::from(path), ConfigSource::Environment);
        }

        if let Ok(path) = env::var("CURBSIDE_SIGNS") {
            self.signs_path.update(PathBuf::from(path), ConfigSource::Environment);
        }

        if let Ok(path) = env::var("CURBSIDE_CATEGORIES") {
            self.categories_path.update(PathBuf::from(path), ConfigSource::Environment);
        }

        if let Ok(crs_str) = env::var("CURBSIDE_CANONICAL_CRS") {
            match parse_epsg(&crs_str) {
                Ok(crs) => self.canonical_crs.update(crs, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid CURBSIDE_CANONICAL_CRS value '{}': expected EPSG code",
                    crs_str
                ),
            }
        }

        if let Ok(crs_str) = env::var("CURBSIDE_PROJECTED_CRS") {
            match parse_epsg(&crs_str) {
                Ok(crs) => self.projected_crs.update(crs, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid CURBSIDE_PROJECTED_CRS value '{}': expected EPSG code",
                    crs_str
                ),
            }
        }

        if let Ok(radius_str) = env::var("CURBSIDE_DEFAULT_RADIUS") {
            match parse_radius(&radius_str) {
                Ok(radius) => self.default_radius_meters.update(radius, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid CURBSIDE_DEFAULT_RADIUS value '{}': expected meters >= 0",
                    radius_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(path) = overrides.zones_path {
            self.zones_path.update(path, ConfigSource::Cli);
        }

        if let Some(path) = overrides.signs_path {
            self.signs_path.update(path, ConfigSource::Cli);
        }

        if let Some(path) = overrides.categories_path {
            self.categories_path.update(path, ConfigSource::Cli);
        }

        if let Some(crs) = overrides.projected_crs {
            self.projected_crs.update(crs, ConfigSource::Cli);
        }

        if let Some(radius) = overrides.default_radius_meters {
            self.default_radius_meters.update(radius, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "zones_path".to_string(),
            (self.zones_path.value.display().to_string(), self.zones_path.source),
        );
        map.insert(
            "signs_path".to_string(),
            (self.signs_path.value.display().to_string(), self.signs_path.source),
        );
        map.insert(
            "categories_path".to_string(),
            (self.categories_path.value.display().to_string(), self.categories_path.source),
        );
        map.insert(
            "canonical_crs".to_string(),
            (format!("EPSG:{}", self.canonical_crs.value), self.canonical_crs.source),
        );
        map.insert(
            "projected_crs".to_string(),
            (format!("EPSG:{}", self.projected_crs.value), self.projected_crs.source),
        );
        map.insert(
            "default_radius_meters".to_string(),
            (format!("{}", self.default_radius_meters.value), self.default_radius_meters.source),
        );

        map
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    zones_path: Option<PathBuf>,
    signs_path: Option<PathBuf>,
    categories_path: Option<PathBuf>,
    canonical_crs: Option<u32>,
    projected_crs: Option<u32>,
    default_radius_meters: Option<f64>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub zones_path: Option<PathBuf>,
    pub signs_path: Option<PathBuf>,
    pub categories_path: Option<PathBuf>,
    pub projected_crs: Option<u32>,
    pub default_radius_meters: Option<f64>,
}

/// Parse an EPSG code, with or without the `EPSG:` prefix
pub fn parse_epsg(s: &str) -> Result<u32> {
    let trimmed = s.trim();
    let code = trimmed
        .strip_prefix("EPSG:")
        .or_else(|| trimmed.strip_prefix("epsg:"))
        .unwrap_or(trimmed);

    code.parse::<u32>().map_err(|_| CurbsideError::ConfigInvalid {
        key: "crs".to_string(),
        reason: format!("Invalid EPSG code: {}", s),
    })
}

/// Parse a search radius in meters
pub fn parse_radius(s: &str) -> Result<f64> {
    let radius = s.trim().parse::<f64>().map_err(|_| CurbsideError::ConfigInvalid {
        key: "default_radius_meters".to_string(),
        reason: format!("Invalid radius: {}", s),
    })?;
    validate_radius(radius)?;
    Ok(radius)
}

fn validate_radius(radius: f64) -> Result<()> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(CurbsideError::ConfigInvalid {
            key: "default_radius_meters".to_string(),
            reason: format!("Radius must be a non-negative number of meters, got {}", radius),
        })
    }
}
