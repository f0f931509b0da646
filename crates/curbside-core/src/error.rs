//! Error types for Curbside

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurbsideError {
    // Dataset errors
    #[error("Failed to load dataset from {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Unsupported geometry type {kind} at feature {feature}")]
    UnsupportedGeometry { feature: String, kind: String },

    #[error("Unsupported format: .{extension}. Supported: {}", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("Dataset not found: {name}")]
    DatasetNotFound { name: String },

    // CRS errors
    #[error("Unsupported CRS: {crs}")]
    UnsupportedCrs { crs: String },

    #[error("Reprojection from {from} to {to} failed: {reason}")]
    Reprojection {
        from: String,
        to: String,
        reason: String,
    },

    #[error("CRS mismatch: expected {expected}, found {found}")]
    CrsMismatch { expected: String, found: String },

    // Query errors
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CurbsideError {
    /// Shorthand for a load failure at `path`
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CurbsideError::Load { path: path.into(), reason: reason.into() }
    }

    /// Shorthand for a rejected query
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        CurbsideError::InvalidQuery { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, CurbsideError>;
