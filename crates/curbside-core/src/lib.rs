//! Curbside Core - Domain models, dataset readers and configuration
//!
//! This crate holds the feature/geometry model shared by the spatial engine,
//! the GeoJSON reader and the layered configuration.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;

pub use error::{CurbsideError, Result};
