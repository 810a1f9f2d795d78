// Medscan - Medication label extraction pipeline
// Copyright (c) 2025 Medscan Contributors
// Licensed under the MIT License

use clap::Parser;
use medscan::cli::{Cli, Commands};
use medscan::config::{load_config, LoggingConfig};
use medscan::logging::{init_logging, LoggingGuard};
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    // This is optional - if .env doesn't exist, it's silently ignored
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let cli = Cli::parse();

    let logging_guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "medscan - Medication label extraction"
    );

    // Cancellation channel for an in-flight extraction
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            tracing::info!("Received SIGINT (Ctrl+C), cancelling...");
                        }
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, cancelling...");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to create SIGTERM handler");
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                        return;
                    }
                    tracing::info!("Received SIGINT (Ctrl+C), cancelling...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            tracing::info!("Received SIGINT (Ctrl+C), cancelling...");
        }

        println!("\n⚠️  Shutdown signal received, abandoning label extraction...");
        let _ = shutdown_tx.send(true);
    });

    // Execute command and get exit code
    let exit_code = match execute_command(&cli, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5 // Fatal error exit code
        }
    };

    // Flush file logs before exiting
    drop(logging_guard);
    process::exit(exit_code);
}

/// Logging from the config file when one can be read, console-only otherwise
///
/// `--log-level` wins over `application.log_level`. A log directory that
/// cannot be created downgrades to console output instead of failing.
fn setup_logging(cli: &Cli) -> medscan::domain::Result<LoggingGuard> {
    let config = match &cli.command {
        Commands::Init(_) => None,
        _ => load_config(&cli.config).ok(),
    };

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());

    let console_only = LoggingConfig::console_only();
    let logging_config = config.as_ref().map(|c| &c.logging).unwrap_or(&console_only);

    match init_logging(&log_level, logging_config) {
        Ok(guard) => Ok(guard),
        Err(e) if logging_config.local_enabled => {
            eprintln!("⚠️  File logging disabled: {e}");
            init_logging(&log_level, &console_only)
        }
        Err(e) => Err(e),
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Extract(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::Add(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
