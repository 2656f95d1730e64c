use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edumon::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "edumon",
    version,
    about = "Education monitoring dashboard backend with student-count seeding tools",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configuration file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard REST API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Import regency student statistics from a JSON file (one row or an array)
    ImportStatistics {
        /// JSON file with the statistic rows
        file: PathBuf,

        /// Validate and report without writing
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Write the run's Prometheus metrics to this file
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },

    /// Distribute regency student statistics over individual schools
    Distribute {
        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Compute and report without writing
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Write the run's Prometheus metrics to this file
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },

    /// Assign deterministic accreditation grades from each NPSN
    Accreditation {
        /// Compute and report without writing
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Write the run's Prometheus metrics to this file
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },

    /// Delete every school, statistic and program
    Reset {
        /// Confirm the deletion
        #[arg(long, default_value = "false")]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config
        .override_log_format(cli.log_format)
        .context("Invalid --log-format")?;

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    match cli.command {
        Commands::Serve { host, port } => {
            tracing::info!(host = ?host, port = ?port, "Starting serve command");
            commands::serve(config, host, port).await?;
        }

        Commands::ImportStatistics {
            file,
            dry_run,
            metrics_file,
        } => {
            tracing::info!(file = %file.display(), dry_run = %dry_run, "Starting import-statistics command");
            commands::import(&config, &file, dry_run, metrics_file.as_deref())?;
        }

        Commands::Distribute {
            seed,
            dry_run,
            metrics_file,
        } => {
            tracing::info!(seed = ?seed, dry_run = %dry_run, "Starting distribute command");
            commands::distribute(&config, seed, dry_run, metrics_file.as_deref())?;
        }

        Commands::Accreditation { dry_run, metrics_file } => {
            tracing::info!(dry_run = %dry_run, "Starting accreditation command");
            commands::accreditation(&config, dry_run, metrics_file.as_deref())?;
        }

        Commands::Reset { yes } => {
            tracing::info!("Starting reset command");
            commands::reset(&config, yes)?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("edumon=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("edumon={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
    }

    Ok(())
}
