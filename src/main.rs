use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use rentmap::config::Config;
use rentmap::constants;
use rentmap::geocoder::{
    geocode_dataset, CachedGeocoder, GeocodeSummary, Geocoder, NominatimGeocoder, SampleGeocoder,
};
use rentmap::logging;
use rentmap::pipeline::ingestion::{load_listings, sample::sample_dataset};
use rentmap::pipeline::storage::{CsvFileStorage, Storage};
use rentmap::pipeline::{self, PipelineResult};
use rentmap::Dataset;

#[derive(Parser)]
#[command(name = "rentmap")]
#[command(about = "Rental listing cleaning and enrichment pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a raw listing file and write the processed dataset
    Process {
        /// Raw listing file (defaults to the configured input)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Where to write the cleaned dataset
        #[arg(long)]
        output: Option<PathBuf>,
        /// Seed for the furnishing backfill
        #[arg(long)]
        seed: Option<u64>,
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the built-in sample listings as a raw input file
    Sample {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Add latitude/longitude to a cleaned dataset
    Geocode {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Defaults to overwriting the input
        #[arg(long)]
        output: Option<PathBuf>,
        /// Query the configured online geocoding service instead of the
        /// built-in gazetteer
        #[arg(long)]
        online: bool,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let path = path
        .or_else(|| std::env::var(constants::ENV_CONFIG_PATH).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_CONFIG_PATH));
    let config = Config::load_or_default(&path)
        .with_context(|| format!("loading config from {}", path.display()))?
        .apply_env()?;
    Ok(config)
}

fn geocode_with<G: Geocoder>(
    inner: G,
    dataset: Dataset,
    config: &Config,
) -> anyhow::Result<(Dataset, GeocodeSummary)> {
    let mut geocoder = CachedGeocoder::open(inner, &config.paths.geocode_cache)?;
    let result = geocode_dataset(
        dataset,
        &mut geocoder,
        &config.geocoding.city,
        &config.geocoding.country,
    )?;
    Ok(result)
}

fn print_summary(result: &PipelineResult) {
    println!("\n📊 Pipeline Results:");
    println!("   Input: {}", result.input);
    println!("   Records loaded: {}", result.records_loaded);
    for stage in &result.stages {
        print!("   {}: {} -> {}", stage.stage, stage.records_in, stage.records_out);
        for (field, count) in &stage.values_filled {
            print!(", {} {} filled", count, field);
        }
        println!();
    }
    println!("   Records written: {}", result.records_written);
    println!("   Output file: {}", result.output);

    if result.validation.passed() {
        println!("\n✅ Data validation passed");
    } else {
        println!("\n⚠️  Data validation warnings:");
        for issue in &result.validation.issues {
            println!("   - {} ({} records)", issue.description, issue.offending_records);
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    let _log_guard = logging::init_logging(&config.paths.log_dir);

    match cli.command {
        Commands::Process {
            input,
            output,
            seed,
            json,
        } => {
            let input = input.unwrap_or_else(|| config.paths.input.clone());
            let storage = CsvFileStorage::new(output.unwrap_or_else(|| config.paths.output.clone()));
            let mut rng = pipeline::rng_for(seed.or(config.seed));

            match pipeline::run(&input, &storage, &config, &mut rng) {
                Ok(result) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&result)?);
                    } else {
                        print_summary(&result);
                    }
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    return Err(e).context("processing listings");
                }
            }
        }
        Commands::Sample { output } => {
            let storage = CsvFileStorage::new(output.unwrap_or_else(|| config.paths.input.clone()));
            let written = storage.persist(&sample_dataset())?;
            println!("✅ Wrote {} sample listings to {}", written, storage.describe());
        }
        Commands::Geocode {
            input,
            output,
            online,
        } => {
            let input = input.unwrap_or_else(|| config.paths.output.clone());
            let storage = CsvFileStorage::new(output.unwrap_or_else(|| input.clone()));

            let dataset = load_listings(&input)
                .with_context(|| format!("reading cleaned dataset {}", input.display()))?;
            let (dataset, summary) = if online {
                info!("Geocoding via {}", config.geocoding.service_url);
                geocode_with(NominatimGeocoder::new(&config.geocoding)?, dataset, &config)?
            } else {
                geocode_with(SampleGeocoder, dataset, &config)?
            };
            storage.persist(&dataset)?;

            info!("Geocoded dataset written to {}", storage.describe());
            println!(
                "✅ Geocoded {} locations ({} fallbacks) into {}",
                summary.unique_locations,
                summary.fallbacks,
                storage.describe()
            );
        }
    }

    Ok(())
}
