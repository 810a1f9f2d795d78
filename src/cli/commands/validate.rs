//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the medscan configuration file.

use super::{report_failure, EXIT_CONFIGURATION, EXIT_OK};
use crate::adapters::database::create_medication_store;
use crate::adapters::vision::resolve_api_key;
use crate::config::{load_config, redact_url_credentials, MedscanConfig};
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    /// Connect to PostgreSQL and create the medications table if missing
    #[arg(long)]
    pub check_database: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading already runs validation
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIGURATION);
            }
        };

        println!();
        print_summary(&config);
        println!();

        if self.check_database {
            return Ok(check_database(&config).await);
        }
        Ok(EXIT_OK)
    }
}

async fn check_database(config: &MedscanConfig) -> i32 {
    println!("🔌 Checking database");

    let store = match create_medication_store(config).await {
        Ok(store) => store,
        Err(e) => return report_failure("Database is not configured", &e),
    };

    if let Err(e) = store.test_connection().await {
        return report_failure("Database connection failed", &e);
    }
    println!("✅ Connected to {}", store.backend_name());

    if let Err(e) = store.ensure_schema().await {
        return report_failure("Failed to create the medications table", &e);
    }
    println!("✅ Medications table is ready");
    println!();
    EXIT_OK
}

fn print_summary(config: &MedscanConfig) {
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!("  Environment: {:?}", config.environment);
    println!("  Dry Run: {}", config.application.dry_run);
    println!(
        "  Inference Endpoint: {}",
        redact_url_credentials(&config.extraction.completions_url())
    );
    println!("  Model: {}", config.extraction.model);
    println!("  Timeout: {}s", config.extraction.timeout_seconds);

    // Missing credentials only disable label scanning, so this is a warning
    match resolve_api_key(&config.extraction) {
        Ok(_) => println!("  API Key: configured"),
        Err(_) => println!(
            "  ⚠️  API Key: not set ({}), label scanning will be unavailable",
            config.extraction.api_key_env
        ),
    }

    match &config.postgresql {
        Some(pg_config) => {
            println!(
                "  PostgreSQL Connection: {}",
                redact_url_credentials(pg_config.connection_string.expose_secret().as_ref())
            );
            println!("  Max Connections: {}", pg_config.max_connections);
            println!("  SSL Mode: {}", pg_config.ssl_mode);
        }
        None => println!("  ⚠️  PostgreSQL: not configured, records can only be saved in dry run"),
    }

    if config.logging.local_enabled {
        println!(
            "  Log Files: {} ({})",
            config.logging.local_path, config.logging.local_rotation
        );
    } else {
        println!("  Log Files: disabled");
    }
}
