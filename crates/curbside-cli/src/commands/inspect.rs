//! Inspect command implementation

use crate::cli::{InspectArgs, InspectTarget};
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, DatasetInfo, InspectConfigOutput, InspectDatasetsOutput};
use anyhow::{Context, Result};
use curbside_core::config::LayeredConfig;
use curbside_geo::engine::PreparedDatasets;
use tabled::Tabled;

pub fn execute(args: InspectArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    match args.target {
        InspectTarget::Datasets => inspect_datasets(config, output),
        InspectTarget::Config => inspect_config(config, output),
    }
}

/// Load every dataset and report counts, repairs and extents
fn inspect_datasets(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let prepared = PreparedDatasets::load(config).context("Failed to load datasets")?;
    let datasets: Vec<DatasetInfo> = prepared.stats.iter().map(DatasetInfo::from).collect();

    if output.is_json() {
        return output.result(InspectDatasetsOutput { datasets });
    }

    output.section("Datasets");

    #[derive(Tabled)]
    struct DatasetRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "CRS")]
        crs: String,
        #[tabled(rename = "Features")]
        features: usize,
        #[tabled(rename = "Repaired")]
        repaired: usize,
        #[tabled(rename = "Emptied")]
        emptied: usize,
        #[tabled(rename = "Bounds")]
        bounds: String,
    }

    let rows: Vec<DatasetRow> = datasets
        .iter()
        .map(|d| DatasetRow {
            name: d.name.clone(),
            crs: d.crs.clone(),
            features: d.features,
            repaired: d.repaired,
            emptied: d.emptied,
            bounds: d
                .bounds
                .map(|[min_x, min_y, max_x, max_y]| {
                    format!("{:.5}, {:.5} .. {:.5}, {:.5}", min_x, min_y, max_x, max_y)
                })
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    output.table(rows);

    for dataset in datasets.iter().filter(|d| d.emptied > 0) {
        output.warning(format!(
            "{}: {} degenerate polygon(s) collapsed to empty geometries",
            dataset.name, dataset.emptied
        ));
    }

    Ok(())
}

/// Show the effective configuration and the layer each value came from
fn inspect_config(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut values: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source })
        .collect();
    values.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        return output.result(InspectConfigOutput { values });
    }

    output.section("Configuration");

    #[derive(Tabled)]
    struct ConfigRow {
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Source")]
        source: String,
    }

    let rows: Vec<ConfigRow> = values
        .into_iter()
        .map(|entry| ConfigRow {
            key: entry.key,
            value: entry.value,
            source: format!("{:?}", entry.source),
        })
        .collect();

    output.table(rows);
    Ok(())
}
