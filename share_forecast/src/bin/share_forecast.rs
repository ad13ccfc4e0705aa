use clap::{Parser, Subcommand};
use share_forecast::logging::init_logging;
use share_forecast::refresh::refresh;
use share_forecast::{
    CsvForecastSink, CsvObservationProvider, ForecastConfig, ForecastPipeline, ForecastSink,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Year-end market share forecasts from weekly album sales
#[derive(Debug, Parser)]
#[command(name = "share-forecast", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "share_forecast.toml")]
    config: PathBuf,

    /// Override the configured forecast year
    #[arg(long, global = true)]
    year: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Forecast every remaining week and replace the forecast table
    Run {
        /// Print the series as JSON instead of writing the table
        #[arg(long)]
        dry_run: bool,
    },
    /// Rebuild the aggregate tables from raw weekly totals
    Refresh {
        /// CSV with year, week, amg_albums, market_albums and optional complete
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match ForecastConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(year) = cli.year {
        config.pipeline.current_year = year;
    }

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match execute(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "share-forecast failed");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command, config: ForecastConfig) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Run { dry_run } => {
            let provider = CsvObservationProvider::new(&config.data.dir);
            let pipeline = ForecastPipeline::new(config.pipeline, provider)?;
            let series = pipeline.run_forecast_series()?;

            if dry_run {
                println!("{}", series.to_json()?);
            } else {
                CsvForecastSink::new(&config.output.path).write(&series)?;
            }
        }
        Command::Refresh { input } => {
            config.pipeline.validate()?;
            refresh(&input, &config.data.dir, &config.pipeline)?;
        }
    }
    Ok(())
}
