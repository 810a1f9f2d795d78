//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for medscan using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// medscan - read medication labels into medication records
#[derive(Parser, Debug)]
#[command(name = "medscan")]
#[command(version, about, long_about = None)]
#[command(author = "Medscan Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "medscan.toml", env = "MEDSCAN_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "MEDSCAN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read a label photo and print the extracted draft as JSON
    Extract(commands::extract::ExtractArgs),

    /// Add a medication from a label photo, manual fields, or both
    Add(commands::add::AddArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
