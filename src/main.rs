//! `merger-tracker` command line entry point

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use merger_tracker_lib::application::{CasePipeline, PipelineOptions, RunReport};
use merger_tracker_lib::infrastructure::logging::init_logging_with_config;
use merger_tracker_lib::infrastructure::{AppConfig, ConfigManager, HttpClient};

#[derive(Parser)]
#[command(name = "merger-tracker")]
#[command(version, about = "Crawl a regulator's merger case listing and case pages")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, env = "MERGER_TRACKER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Maximum concurrent detail fetches (1 = sequential)
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Write raw detail pages to this directory
    #[arg(long, global = true)]
    dump_dir: Option<PathBuf>,

    /// Dump only the first detail page
    #[arg(long, global = true)]
    dump_first_detail: bool,

    /// Request the listing as a JSON API response
    #[arg(long, global = true)]
    json_api: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the listing and write the listing artifact
    Listing {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Enrich an existing listing artifact with case details
    Details {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Listing and details in one run
    Run {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        listing_output: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn config_manager(global: &GlobalArgs) -> Result<ConfigManager> {
    match &global.config {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new(),
    }
}

/// Fold command line flags over the loaded configuration
fn apply_overrides(config: &mut AppConfig, global: &GlobalArgs, command: &Commands) {
    if let Some(level) = &global.log_level {
        config.logging.level.clone_from(level);
    }
    if let Some(concurrency) = global.concurrency {
        config.crawling.detail_max_concurrent = concurrency;
    }
    if let Some(dir) = &global.dump_dir {
        config.crawling.dump_dir = Some(dir.clone());
    }
    config.crawling.dump_first_detail |= global.dump_first_detail;
    config.source.json_api |= global.json_api;

    let (url, listing_path, detailed_path) = match command {
        Commands::Listing { url, output } => (url, output, &None),
        Commands::Details { input, output } => (&None, input, output),
        Commands::Run {
            url,
            listing_output,
            output,
        } => (url, listing_output, output),
        Commands::InitConfig { .. } => return,
    };

    if let Some(url) = url {
        config.source.listing_url.clone_from(url);
    }
    if let Some(path) = listing_path {
        config.source.listing_path.clone_from(path);
    }
    if let Some(path) = detailed_path {
        config.source.detailed_path.clone_from(path);
    }
}

async fn init_config(manager: &ConfigManager, force: bool) -> Result<String> {
    if manager.config_path().exists() && !force {
        bail!(
            "Configuration file {} already exists (use --force to overwrite)",
            manager.config_path().display()
        );
    }
    manager.save_config(&AppConfig::default()).await?;
    Ok(format!("Wrote default configuration to {}", manager.config_path().display()))
}

fn success_message(stage: &str, report: &RunReport) -> String {
    let mut message =
        format!("{stage}: wrote {} cases to {}", report.cases, report.artifact.display());
    if report.degraded > 0 {
        message.push_str(&format!(" ({} with empty details)", report.degraded));
    }
    message
}

/// Pipeline entry point selected on the command line
enum Stage {
    Listing,
    Details,
    Full,
}

async fn run(cli: Cli) -> Result<String> {
    let manager = config_manager(&cli.global)?;
    let stage = match &cli.command {
        Commands::InitConfig { force } => return init_config(&manager, *force).await,
        Commands::Listing { .. } => Stage::Listing,
        Commands::Details { .. } => Stage::Details,
        Commands::Run { .. } => Stage::Full,
    };

    let mut config = manager.load_config().await?;
    apply_overrides(&mut config, &cli.global, &cli.command);
    init_logging_with_config(&config.logging)?;
    info!("Using configuration {}", manager.config_path().display());

    let client = HttpClient::from_http_config(&config.http).context("Failed to build HTTP client")?;
    let options = PipelineOptions::from_config(&config);
    let pipeline = CasePipeline::new(Arc::new(client), &config.parsing, options)?;

    let message = match stage {
        Stage::Listing => success_message("Listing", &pipeline.run_listing().await?),
        Stage::Details => success_message("Details", &pipeline.run_details().await?),
        Stage::Full => success_message("Run", &pipeline.run_full().await?),
    };
    Ok(message)
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(message) => {
            info!("{}", message);
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
