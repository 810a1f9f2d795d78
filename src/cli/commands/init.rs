//! Init command implementation
//!
//! This module implements the `init` command for generating a starter
//! configuration file.

use super::{EXIT_CONFIGURATION, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "medscan.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing medscan configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIGURATION);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set OPENAI_API_KEY for label scanning");
                println!("     - Set MEDSCAN_DATABASE_URL to save records in PostgreSQL");
                println!("  3. Uncomment the [postgresql] section (the medications table is created on first save)");
                println!("  4. Validate configuration: medscan validate-config");
                println!("  5. Read a label: medscan extract --image label.jpg");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    fn generate_config() -> &'static str {
        r#"# medscan Configuration File
# Medication label photo to medication record

# development | staging | production
# Production requires an https:// inference endpoint.
environment = "development"

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Validate and reconcile, but skip the database write
dry_run = false

[extraction]
# OpenAI-compatible API base URL (without /chat/completions)
base_url = "https://api.openai.com/v1"

# Vision-capable model
model = "gpt-4o-mini"
max_tokens = 500
temperature = 0.1

# Bounded wait for one extraction, in seconds (1-300)
timeout_seconds = 30

# Environment variable holding the API key, read for every request
api_key_env = "OPENAI_API_KEY"

# Largest accepted label photo, in bytes
max_image_bytes = 20971520

# [postgresql]
# connection_string = "${MEDSCAN_DATABASE_URL}"
# max_connections = 10
# connection_timeout_seconds = 30
# statement_timeout_seconds = 60
# ssl_mode = "prefer"                # disable | prefer | require

[logging]
# JSON log files with rotation (daily or hourly)
local_enabled = false
local_path = "/var/log/medscan"
local_rotation = "daily"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use tempfile::TempDir;

    #[test]
    fn test_generated_config_is_valid() {
        let config = load_config_from_str(InitArgs::generate_config()).unwrap();
        assert_eq!(config.extraction.model, "gpt-4o-mini");
        assert_eq!(config.extraction.max_tokens, 500);
        assert!(config.postgresql.is_none());
        assert!(!config.logging.local_enabled);
    }

    #[tokio::test]
    async fn test_init_writes_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("medscan.toml");
        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: false,
        };

        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&output)
            .unwrap()
            .contains("[extraction]"));
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("medscan.toml");
        fs::write(&output, "# keep me").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "# keep me");

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: true,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
    }
}
