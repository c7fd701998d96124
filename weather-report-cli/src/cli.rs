use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use weather_report_core::{
    Config, DataFormat, OpenWeatherClient, ReportOptions, analyzer, client::fetch_batch,
    config::PLACEHOLDER_API_KEY, report, store,
};

const SAMPLE_CITIES: &str = "London\nTokyo\nMumbai\nNew York\nSydney\nCairo\nMoscow\nRio de Janeiro\n";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-report",
    version,
    about = "Weather analysis & report generation CLI"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create sample files and configure the API key interactively.
    Setup,

    /// Fetch weather data for cities and save it to a file.
    Fetch {
        /// Path to the cities file (one city name per line).
        #[arg(short = 'f', long)]
        cities_file: Option<PathBuf>,

        /// Output data file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format.
        #[arg(long, default_value_t = DataFormat::Csv)]
        format: DataFormat,
    },

    /// Analyze saved weather data and generate a report.
    Analyze {
        /// Input data file.
        #[arg(short, long)]
        data_file: Option<PathBuf>,

        /// Output report file.
        #[arg(short, long)]
        report_file: Option<PathBuf>,

        /// Include the detailed data table in the report.
        #[arg(short = 't', long)]
        show_table: bool,
    },

    /// Run the complete workflow: fetch, analyze and generate a report.
    Run {
        /// Path to the cities file (one city name per line).
        #[arg(short = 'f', long)]
        cities_file: Option<PathBuf>,

        /// Output data file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output report file.
        #[arg(short, long)]
        report_file: Option<PathBuf>,

        /// Data output format.
        #[arg(long, default_value_t = DataFormat::Csv)]
        format: DataFormat,

        /// Include the detailed data table in the report.
        #[arg(short = 't', long)]
        show_table: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Setup => setup(config),
            Command::Fetch {
                cities_file,
                output,
                format,
            } => {
                fetch(&config, cities_file, output, format).await?;
                Ok(())
            }
            Command::Analyze {
                data_file,
                report_file,
                show_table,
            } => analyze(&config, data_file, report_file, show_table),
            Command::Run {
                cities_file,
                output,
                report_file,
                format,
                show_table,
            } => {
                let data_file = fetch(&config, cities_file, output, format).await?;
                analyze(&config, Some(data_file), report_file, show_table)?;
                println!("Complete workflow finished.");
                Ok(())
            }
        }
    }
}

/// Fetch weather for every city in the cities file and save the result.
/// Returns the path the data was written to, for the `run` composition.
async fn fetch(
    config: &Config,
    cities_file: Option<PathBuf>,
    output: Option<PathBuf>,
    format: DataFormat,
) -> Result<PathBuf> {
    // Fail fast on a missing or placeholder key, before any network activity.
    config.require_api_key()?;

    let cities_path = cities_file.unwrap_or_else(|| config.cities_file.clone());
    let cities = store::read_cities(&cities_path).with_context(|| {
        format!(
            "Could not get city names from {}. Create it with one city name per line, \
             or run `weather-report setup`.",
            cities_path.display()
        )
    })?;

    println!("Fetching weather data for {} cities...", cities.len());

    let client = OpenWeatherClient::new(config)?;
    let outcome = fetch_batch(&client, &cities, config.rate_limit_delay()).await;

    for failure in &outcome.failures {
        println!("  Skipped {}: {}", failure.city, failure.error);
    }

    if outcome.observations.is_empty() {
        bail!("No weather data collected. Check your API key and internet connection.");
    }

    let output = output.unwrap_or_else(|| config.data_file.clone());
    store::save(&outcome.observations, &output, format)?;

    println!(
        "Saved weather data to {} ({} succeeded, {} failed)",
        output.display(),
        outcome.succeeded(),
        outcome.failed()
    );

    Ok(output)
}

/// Load saved observations, compute the analysis and write the report.
fn analyze(
    config: &Config,
    data_file: Option<PathBuf>,
    report_file: Option<PathBuf>,
    show_table: bool,
) -> Result<()> {
    let data_path = data_file.unwrap_or_else(|| config.data_file.clone());
    let format = DataFormat::from_path(&data_path);

    let observations = store::load(&data_path, format)
        .with_context(|| format!("Run `weather-report fetch` first to create {}", data_path.display()))?;

    println!("Analyzing weather data for {} cities...", observations.len());

    let analysis = analyzer::compute(&observations, &config.bands)?;

    let options = ReportOptions {
        include_table: show_table,
        generated_at: Utc::now(),
    };
    let rendered = report::render(&analysis, &observations, &options);

    let report_path = report_file.unwrap_or_else(|| config.report_file.clone());
    fs::write(&report_path, &rendered)
        .with_context(|| format!("Failed to write report file: {}", report_path.display()))?;

    println!("{rendered}");
    println!("Analysis complete. Report saved to {}", report_path.display());

    Ok(())
}

/// Write sample files and prompt for the API key when none is configured.
fn setup(mut config: Config) -> Result<()> {
    println!("Setting up the weather-report tool...");

    if !config.cities_file.exists() {
        fs::write(&config.cities_file, SAMPLE_CITIES).with_context(|| {
            format!(
                "Failed to create sample cities file: {}",
                config.cities_file.display()
            )
        })?;
        println!("Created sample cities file: {}", config.cities_file.display());
    } else {
        println!(
            "Cities file {} already exists, leaving it unchanged.",
            config.cities_file.display()
        );
    }

    if config.require_api_key().is_err() {
        let key = inquire::Text::new("OpenWeatherMap API key:")
            .with_help_message("Get a free key from https://openweathermap.org/api (leave empty to skip)")
            .prompt()
            .context("Failed to read API key from terminal")?;

        let key = key.trim();
        config.api_key = if key.is_empty() {
            PLACEHOLDER_API_KEY.to_string()
        } else {
            key.to_string()
        };
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    print_instructions(&config.cities_file);
    Ok(())
}

fn print_instructions(cities_file: &Path) {
    println!();
    println!("Next steps:");
    println!("1. Make sure your OpenWeatherMap API key is configured");
    println!("   (environment variable OPENWEATHER_API_KEY also works).");
    println!(
        "2. Edit {} to list your desired cities, one per line.",
        cities_file.display()
    );
    println!("3. Run: weather-report run");
}
