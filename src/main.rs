//! Subverse - Song Subtitle Translation
//!
//! Entry point: parses arguments, sets up logging, loads configuration and
//! runs the interactive translation workflow.

use std::io::BufReader;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use subverse::cli::Args;
use subverse::config::Config;
use subverse::error::SubverseError;
use subverse::shell::Prompter;
use subverse::workflow::{RunOptions, Workflow};

const DEFAULT_CONFIG_FILE: &str = "subverse.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = setup_logging(args.verbose) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    // The run lives on its own task so blocking prompts never hide Ctrl-C
    let task = tokio::spawn(run(args));

    tokio::select! {
        joined = task => match joined {
            Ok(Ok(())) => {
                info!("Subverse completed successfully");
                ExitCode::SUCCESS
            }
            Ok(Err(e)) if is_cancelled(&e) => {
                info!("{:#}", e);
                println!("\nOperation cancelled.");
                ExitCode::SUCCESS
            }
            Ok(Err(e)) => {
                error!("{:#}", e);
                eprintln!("\nError: {:?}", e);
                ExitCode::FAILURE
            }
            Err(e) => {
                error!("Translation task panicked: {}", e);
                eprintln!("\nUnexpected error in the main flow: {}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted by user");
            eprintln!("\nProcess interrupted by the user.");
            // A prompt may still be blocked on stdin; do not wait for it
            std::process::exit(130)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Starting Subverse - Song Subtitle Translation");

    if let Some(path) = &args.init_config {
        Config::default()
            .save_to_file(path)
            .with_context(|| format!("Failed to write default configuration to {}", path.display()))?;
        println!("Default configuration written to {}", path.display());
        return Ok(());
    }

    let config = load_config(&args)?;

    // Resolves the credential before anything else happens
    let workflow = Workflow::new(config)?;

    let work_dir = std::env::current_dir().context("Cannot determine the working directory")?;
    let mut options = RunOptions::new(work_dir);
    options.input = args.input;
    options.source_language = args.source_lang;
    options.target_language = args.target_lang;
    options.assume_yes = args.yes;
    options.show_progress = true;

    println!("=== Subverse: song subtitle translator ===");
    let mut prompter = Prompter::new(BufReader::new(std::io::stdin()), std::io::stdout());
    let summary = workflow.run(options, &mut prompter).await?;

    info!(
        "Translated {} unique texts across {} events into {}",
        summary.report.unique_texts,
        summary.report.events,
        summary.output_path.display()
    );
    Ok(())
}

/// Declining a prompt ends the run without it being an error
fn is_cancelled(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<SubverseError>(), Some(SubverseError::Cancelled(_)))
}

/// Explicit path, then `subverse.toml` in the working directory, then defaults.
/// Command line flags override file values.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    if let Some(batch_size) = args.batch_size {
        config.translate.batch_size = batch_size;
    }
    if let Some(concurrency) = args.concurrency {
        config.translate.concurrency = concurrency;
    }
    if let Some(model) = &args.model {
        config.translate.model = model.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".subverse").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotated file log
    let file_appender = rolling::daily(&log_dir, "subverse.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("subverse.log").display());

    Ok(())
}
