use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use lapdelta::{
    AnalysisConfig, FileBasedCache, LapDeltaError, LapSelector, TelemetryProvider,
    analysis::{CornerPreset, compare_laps, stints_for_driver},
    telemetry::{CachedProvider, JsonlSessionProvider, LapRecord, fastest_lap, valid_laps},
};
use log::{error, info, warn};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Session file in JSON Lines format
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Write JSON output to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Read the session straight from the file, bypassing the response cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare a lap of driver B against a lap of driver A
    Compare {
        #[arg(long)]
        driver_a: String,
        /// Lap number, the fastest valid lap when omitted
        #[arg(long)]
        lap_a: Option<u32>,
        #[arg(long)]
        driver_b: String,
        #[arg(long)]
        lap_b: Option<u32>,
        /// Resolution of the shared distance axis
        #[arg(short, long)]
        resolution: Option<usize>,
        #[arg(short, long, value_enum)]
        preset: Option<CornerPreset>,
        /// Store the resolution and preset used here as the new defaults
        #[arg(long)]
        save_defaults: bool,
    },
    /// Tyre stints of each driver over the session
    Stints {
        #[arg(short, long, required = true)]
        driver: Vec<String>,
    },
    /// Valid laps of a driver, fastest first
    Laps {
        #[arg(short, long)]
        driver: String,
    },
}

#[derive(Serialize)]
struct DriverStints {
    driver: String,
    stints: Vec<lapdelta::TyreStint>,
}

fn write_output<T: Serialize>(output: Option<&PathBuf>, value: &T) -> Result<(), LapDeltaError> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).map_err(|e| LapDeltaError::OutputIOError { source: e })?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| LapDeltaError::OutputSerializeError { source: e })?;
    writeln!(writer).map_err(|e| LapDeltaError::OutputIOError { source: e })?;
    writer
        .flush()
        .map_err(|e| LapDeltaError::OutputIOError { source: e })
}

fn select_lap(
    laps: &[LapRecord],
    driver: &str,
    lap_number: Option<u32>,
) -> Result<LapSelector, LapDeltaError> {
    match lap_number {
        Some(lap_number) => Ok(LapSelector::new(driver, lap_number)),
        None => fastest_lap(laps, driver)
            .map(|lap| LapSelector::new(driver, lap.lap_number))
            .ok_or_else(|| LapDeltaError::NoValidLaps {
                driver: driver.to_string(),
            }),
    }
}

fn run(
    provider: &mut impl TelemetryProvider,
    command: &Commands,
    config: AnalysisConfig,
    output: Option<&PathBuf>,
) -> Result<(), LapDeltaError> {
    let laps = provider.session_laps()?;
    match command {
        Commands::Compare {
            driver_a,
            lap_a,
            driver_b,
            lap_b,
            resolution,
            preset,
            save_defaults,
        } => {
            let config = AnalysisConfig {
                n_points: resolution.unwrap_or(config.n_points),
                corner_preset: preset.unwrap_or(config.corner_preset),
                ..config
            };
            if config.n_points == 0 {
                return Err(LapDeltaError::InvalidUserInput {
                    field: "resolution".to_string(),
                    reason: "resolution must be at least one point".to_string(),
                });
            }
            if *save_defaults {
                config.save()?;
                info!("Saved analysis defaults");
            }
            let selector_a = select_lap(&laps, driver_a, *lap_a)?;
            let selector_b = select_lap(&laps, driver_b, *lap_b)?;
            let telemetry_a = provider.lap_telemetry(&selector_a)?;
            let telemetry_b = provider.lap_telemetry(&selector_b)?;

            let comparison = compare_laps(&telemetry_a, &telemetry_b, &config)?;
            info!(
                "{} faster by {:.3}s",
                comparison.summary.faster_driver, comparison.summary.margin_s
            );
            write_output(output, &comparison)
        }
        Commands::Stints { driver } => {
            let stints: Vec<DriverStints> = driver
                .iter()
                .map(|d| DriverStints {
                    driver: d.clone(),
                    stints: stints_for_driver(&laps, d),
                })
                .collect();
            write_output(output, &stints)
        }
        Commands::Laps { driver } => write_output(output, &valid_laps(&laps, driver)),
    }
}

fn analyze(cli: &Args) -> Result<(), LapDeltaError> {
    let input = cli
        .input
        .clone()
        .ok_or_else(|| LapDeltaError::InvalidUserInput {
            field: "input".to_string(),
            reason: "a session file is required".to_string(),
        })?;

    let config = match AnalysisConfig::from_local_file() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            warn!("Ignoring unreadable config file: {}", e);
            AnalysisConfig::default()
        }
    };

    let mut session = JsonlSessionProvider::open(input)?;
    if cli.no_cache {
        return run(&mut session, &cli.command, config, cli.output.as_ref());
    }

    let cache = match &config.cache_dir {
        Some(dir) => FileBasedCache::new(dir.clone())?,
        None => FileBasedCache::new_default()?,
    };
    let mut provider = CachedProvider::new(session, cache);
    run(&mut provider, &cli.command, config, cli.output.as_ref())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    if let Err(e) = analyze(&cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
