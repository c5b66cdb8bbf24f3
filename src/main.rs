use clap::{Parser, Subcommand};
use dailycarto::config::{self, LoggingConfig};
use dailycarto::date::DateContext;
use dailycarto::log::{Logger, TracingLogger};
use dailycarto::pipeline::{DailyCarto, Job, KeyResources, Pipeline};
use dailycarto::result::PipelineResult;
use dailycarto::{output, social};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Shared flags for commands that prepare artifacts.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Day to prepare, as YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<String>,

    /// Regenerate even if the archive already holds every target
    #[arg(long)]
    force: bool,
}

fn version_string() -> &'static str {
    let hash = env!("DAILYCARTO_GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{}@{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "dailycarto")]
#[command(about = "Prepares, archives and publishes the daily carto artifacts")]
#[command(long_about = "\
Prepares, archives and publishes the daily carto artifacts

Every root folder holds one YYYY/MM/DD partition per day:

  <source>/2024/03/05/
  ├── Carto Twitter.png        # Daily carto, base layer
  ├── Legend Twitter.png       # Daily carto, drawn on top
  ├── Key resources.png        # Key resources image
  └── key_resources.csv        # Key resources table

  <archive>/2024/03/05/        # key-resources.jpg, key-resources.csv, daily-carto.png
  <public>/2024/03/05/         # same files, CSV reduced to public columns
  <public>/current/

A day whose archive already holds every target is not regenerated unless
--force is given. Root folders come from config.toml or from the
DATA_SOURCE_FOLDER, DATA_ARCHIVE_FOLDER and DATA_PUBLIC_FOLDER variables
(a .env file is read if present).

Run 'dailycarto gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prepare the key resources image and table
    KeyResources(RunArgs),
    /// Prepare the daily carto (carto + legend)
    DailyCarto(RunArgs),
    /// Prepare the key resources, then post them as a thread
    PostKeyResources(RunArgs),
    /// Prepare the daily carto, then post it
    PostDailyCarto(RunArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }

    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading {}: {e}", cli.config.display());
            return ExitCode::from(2);
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error opening log file: {e}");
        return ExitCode::from(2);
    }

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger);
    let pipeline = Pipeline::new(config, logger.clone());

    let success = match cli.command {
        Command::KeyResources(args) => prepare(&pipeline, &KeyResources, &args).success,
        Command::DailyCarto(args) => prepare(&pipeline, &DailyCarto, &args).success,
        Command::PostKeyResources(args) => {
            let result = prepare(&pipeline, &KeyResources, &args);
            // An unparseable date already failed the preparation; posting is skipped.
            let date = DateContext::resolve(args.date.as_deref()).unwrap_or_else(|_| DateContext::today());
            let poster = social::LogPoster::new(logger.clone());
            let outcome = social::publish_key_resources(&result, &date, &poster, logger.as_ref());
            output::print_post_outcome(&outcome);
            outcome.success
        }
        Command::PostDailyCarto(args) => {
            let result = prepare(&pipeline, &DailyCarto, &args);
            let poster = social::LogPoster::new(logger.clone());
            let outcome = social::publish_daily_carto(&result, &poster, logger.as_ref());
            output::print_post_outcome(&outcome);
            outcome.success
        }
        Command::GenConfig => true,
    };

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn prepare(pipeline: &Pipeline, job: &dyn Job, args: &RunArgs) -> PipelineResult {
    let result = pipeline.run(job, args.date.as_deref(), args.force);
    output::print_result(job.label(), &result);
    result
}

/// Install the global subscriber: stderr always, plus the configured log
/// file. `RUST_LOG` takes precedence over `logging.level`.
fn init_logging(logging: &LoggingConfig) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.to_lowercase().replace("warning", "warn")));

    let file_layer = match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}
