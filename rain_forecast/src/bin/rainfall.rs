//! Rainfall forecasting CLI
//!
//! Trains one model per station, stores the results and renders stored
//! results for plotting.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rain_forecast::dashboard::{plot_frame, plot_points, read_coordinates, write_plot_csv};
use rain_forecast::{
    run_batch, CsvSeriesLoader, LstmForecaster, PipelineConfig, ResultStore,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rainfall")]
#[command(about = "Monthly rainfall forecasting per weather station", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Train and evaluate every configured station
    Run {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory of <station>.csv files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Root of the result store
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Training epochs per station
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Station to process (repeatable)
        #[arg(short, long = "station")]
        stations: Vec<String>,
    },

    /// Print or export the stored results of a station
    Show {
        /// Station identifier
        #[arg(short, long)]
        station: String,

        /// Root of the result store
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// LOCATIONS.csv with Station, Lat and Lon columns
        #[arg(long)]
        coordinates: Option<PathBuf>,

        /// Write the plot frame to this CSV file instead of printing it
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Print the default configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            config,
            data_dir,
            output_dir,
            epochs,
            stations,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::from_toml_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir;
            }
            if let Some(output_dir) = output_dir {
                config.output_dir = output_dir;
            }
            if let Some(epochs) = epochs {
                config.epochs = epochs;
            }
            if !stations.is_empty() {
                config.stations = stations;
            }
            run(&config)
        }
        Commands::Show {
            station,
            output_dir,
            coordinates,
            csv,
        } => show(&station, output_dir, coordinates, csv),
        Commands::Config => {
            print!("{}", PipelineConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn run(config: &PipelineConfig) -> Result<()> {
    config.validate()?;
    info!(
        stations = config.stations.len(),
        data_dir = %config.data_dir.display(),
        output_dir = %config.output_dir.display(),
        "starting batch"
    );

    let source = CsvSeriesLoader::new(&config.data_dir).with_value_column(&config.value_column);
    let forecaster = LstmForecaster::new(config.lstm.clone())?;
    let store = ResultStore::new(&config.output_dir);

    let report = run_batch(config, &source, &forecaster, Some(&store))?;

    println!("{:<12} {:>10} {:>10}", "station", "rmse", "mae");
    for (station, bundle) in &report.bundles {
        let evaluation = &bundle.results.evaluation;
        println!("{:<12} {:>10.3} {:>10.3}", station, evaluation.rmse, evaluation.mae);
    }
    for failure in &report.failures {
        println!("{:<12} skipped: {}", failure.station, failure.error);
    }

    if report.bundles.is_empty() {
        bail!("no station produced a result");
    }
    Ok(())
}

fn show(
    station: &str,
    output_dir: PathBuf,
    coordinates: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<()> {
    let store = ResultStore::new(output_dir);
    let results = store
        .load_results(station)
        .with_context(|| format!("no stored results for '{}'", station))?;

    println!("Station: {} ({})", results.station, results.model_name);
    if let Some(path) = coordinates {
        let locations = read_coordinates(&path)?;
        match locations.get(&station.to_lowercase()) {
            Some(c) => println!("Location: {:.4}, {:.4}", c.lat, c.lon),
            None => println!("Location: unknown"),
        }
    }
    print!("{}", results.evaluation);

    let mut frame = plot_frame(&plot_points(&results))?;
    match csv {
        Some(path) => {
            write_plot_csv(&path, &mut frame)?;
            println!("Wrote {} rows to {}", frame.height(), path.display());
        }
        None => println!("{}", frame),
    }
    Ok(())
}
