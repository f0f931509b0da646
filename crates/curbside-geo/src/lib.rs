//! Curbside Geo - Geometry repair, CRS transforms and spatial queries
//!
//! Datasets are loaded through the [`store`], repaired by [`validation`],
//! indexed by [`index`] and served by the [`engine`].

pub mod engine;
pub mod index;
pub mod models;
pub mod store;
pub mod transform;
pub mod validation;

pub use engine::{LocationReport, QueryEngine};
pub use store::{CollectionStats, GeometryStore};
