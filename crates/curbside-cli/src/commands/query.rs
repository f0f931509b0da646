//! Query command implementation

use crate::cli::{QueryArgs, QueryTarget};
use crate::output::OutputWriter;
use crate::output_types::{to_geojson, QueryOutput};
use anyhow::{Context, Result};
use curbside_core::config::LayeredConfig;
use curbside_geo::models::{AttributeValue, Feature};
use curbside_geo::QueryEngine;
use tabled::Tabled;

pub fn execute(args: QueryArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let engine = QueryEngine::from_config(config).context("Failed to load datasets")?;
    let radius = args.radius.unwrap_or(engine.default_radius());
    let wants = |target: QueryTarget| args.only == QueryTarget::All || args.only == target;

    let zones = wants(QueryTarget::Zones)
        .then(|| engine.zone_containment(args.lat, args.lon))
        .transpose()?;
    let categories = wants(QueryTarget::Categories)
        .then(|| engine.category_containment(args.lat, args.lon))
        .transpose()?;
    let signs = wants(QueryTarget::Signs)
        .then(|| engine.proximity_search(args.lat, args.lon, args.radius))
        .transpose()?;

    if output.is_json() {
        return output.result(QueryOutput {
            lat: args.lat,
            lon: args.lon,
            radius_meters: radius,
            zones: zones.as_deref().map(to_geojson),
            categories: categories.as_deref().map(to_geojson),
            signs: signs.as_deref().map(to_geojson),
        });
    }

    output.kv("Location", format!("{}, {}", args.lat, args.lon));

    let nothing = [zones.as_ref(), categories.as_ref(), signs.as_ref()]
        .into_iter()
        .all(|found| found.map_or(true, |f| f.is_empty()));
    if nothing {
        output.info("Nothing applies at this location");
        return Ok(());
    }

    if let Some(zones) = zones {
        output.section(format!("Zones ({})", zones.len()));
        output.table(rows(&zones));
    }
    if let Some(categories) = categories {
        output.section(format!("Categories ({})", categories.len()));
        output.table(rows(&categories));
    }
    if let Some(signs) = signs {
        output.section(format!("Signs within {} m ({})", radius, signs.len()));
        output.table(rows(&signs));
    }

    Ok(())
}

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Geometry")]
    geometry: String,
    #[tabled(rename = "Attributes")]
    attributes: String,
}

fn rows(features: &[&Feature]) -> Vec<FeatureRow> {
    features
        .iter()
        .map(|f| FeatureRow {
            id: f.id.clone(),
            geometry: f.geometry.geometry_type().to_string(),
            attributes: f
                .attributes
                .iter()
                .map(|(k, v)| format!("{}={}", k, display_value(v)))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

fn display_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Number(n) => n.to_string(),
        AttributeValue::String(s) => s.clone(),
    }
}
