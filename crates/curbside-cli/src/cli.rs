use clap::{Parser, Subcommand};
use curbside_core::config::{parse_epsg, parse_radius};
use std::path::PathBuf;

/// Curbside - parking zone, category and sign lookup
#[derive(Parser, Debug)]
#[command(name = "curbside")]
#[command(about = "Inspect parking datasets and run point lookups", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML configuration file (defaults to ./curbside.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Residential parking zones dataset
    #[arg(long, global = true, value_name = "PATH")]
    pub zones: Option<PathBuf>,

    /// Parking signs dataset
    #[arg(long, global = true, value_name = "PATH")]
    pub signs: Option<PathBuf>,

    /// Parking categories dataset
    #[arg(long, global = true, value_name = "PATH")]
    pub categories: Option<PathBuf>,

    /// Metric CRS used for sign distances (e.g. 3857 or EPSG:3857)
    #[arg(long, global = true, value_name = "EPSG", value_parser = parse_projected_crs)]
    pub projected_crs: Option<u32>,

    /// Sign search radius in meters used when a query gives none
    #[arg(long, global = true, value_name = "METERS", value_parser = parse_default_radius)]
    pub default_radius: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the datasets and report what was loaded
    Inspect(InspectArgs),

    /// Look up everything that applies at a location
    Query(QueryArgs),
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// What to inspect
    #[arg(value_enum, default_value = "datasets")]
    pub target: InspectTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InspectTarget {
    /// Per-dataset feature counts, repairs and bounds
    Datasets,
    /// Effective configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Latitude in degrees (WGS 84)
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees (WGS 84)
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Sign search radius in meters (defaults to the configured radius)
    #[arg(long)]
    pub radius: Option<f64>,

    /// Restrict the lookup to one dataset
    #[arg(long, value_enum, default_value = "all")]
    pub only: QueryTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum QueryTarget {
    All,
    Zones,
    Categories,
    Signs,
}

fn parse_projected_crs(s: &str) -> Result<u32, String> {
    parse_epsg(s).map_err(|e| e.to_string())
}

fn parse_default_radius(s: &str) -> Result<f64, String> {
    parse_radius(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_accepts_negative_coordinates() {
        let cli =
            Cli::try_parse_from(["curbside", "query", "--lat", "-41.2865", "--lon", "174.7762"])
                .unwrap();

        let Commands::Query(args) = cli.command else {
            panic!("Expected query command");
        };
        assert_eq!(args.lat, -41.2865);
        assert_eq!(args.lon, 174.7762);
        assert_eq!(args.radius, None);
        assert_eq!(args.only, QueryTarget::All);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "curbside",
            "inspect",
            "config",
            "--json",
            "--projected-crs",
            "EPSG:2193",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.projected_crs, Some(2193));
        let Commands::Inspect(args) = cli.command else {
            panic!("Expected inspect command");
        };
        assert_eq!(args.target, InspectTarget::Config);
    }

    #[test]
    fn test_bad_projected_crs_rejected() {
        let result = Cli::try_parse_from(["curbside", "--projected-crs", "mercator", "inspect"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_radius_flag() {
        let cli = Cli::try_parse_from(["curbside", "inspect", "--default-radius", "25"]).unwrap();
        assert_eq!(cli.default_radius, Some(25.0));

        let negative = Cli::try_parse_from(["curbside", "--default-radius=-3", "inspect"]);
        assert!(negative.is_err());
        let junk = Cli::try_parse_from(["curbside", "--default-radius", "far", "inspect"]);
        assert!(junk.is_err());
    }
}
