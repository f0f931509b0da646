//! Dataset reader abstraction
//!
//! Each on-disk format implements [`FormatReader`]; the [`FormatRegistry`]
//! picks the reader for a path from its extension.

use std::path::Path;

use crate::error::{CurbsideError, Result};
use crate::models::{Crs, Feature};

pub mod geojson;

/// Format reader trait that all format implementations must implement
pub trait FormatReader: Send + Sync {
    /// Read a dataset from the given path
    fn read(&self, path: &Path) -> Result<FormatDataset>;

    /// Get supported file extensions (e.g., ["json", "geojson"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name
    fn format_name(&self) -> &str;
}

/// Dataset as parsed from a source file, before any CRS handling
#[derive(Debug, Clone)]
pub struct FormatDataset {
    /// Dataset name (file stem)
    pub name: String,

    /// CRS declared inside the file, if any
    pub crs: Option<Crs>,

    /// Features with a supported geometry
    pub features: Vec<Feature>,

    /// Features dropped because they had no geometry
    pub skipped: usize,
}

/// Central registry for format readers
pub struct FormatRegistry {
    readers: Vec<Box<dyn FormatReader>>,
}

impl FormatRegistry {
    /// Create a new empty format registry
    pub fn new() -> Self {
        Self { readers: Vec::new() }
    }

    /// Registry with every built-in reader
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(geojson::GeoJsonReader));
        registry
    }

    /// Register a format reader
    pub fn register(&mut self, reader: Box<dyn FormatReader>) {
        self.readers.push(reader);
    }

    /// Detect format and return appropriate reader
    pub fn detect_format(&self, path: &Path) -> Result<&dyn FormatReader> {
        let extension = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            CurbsideError::UnsupportedFormat {
                extension: "none".to_string(),
                supported: self.supported_formats(),
            }
        })?;

        let extension = extension.to_ascii_lowercase();
        self.readers
            .iter()
            .find(|r| r.supported_extensions().contains(&extension.as_str()))
            .map(|r| r.as_ref())
            .ok_or_else(|| CurbsideError::UnsupportedFormat {
                extension,
                supported: self.supported_formats(),
            })
    }

    /// Get list of all supported format extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|r| r.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    /// Get all registered readers
    pub fn readers(&self) -> &[Box<dyn FormatReader>] {
        &self.readers
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
