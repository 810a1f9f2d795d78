//! Extract command implementation
//!
//! Runs acquisition, extraction and parsing for one label photo and prints
//! the resulting draft as JSON on stdout. Nothing is stored.

use super::{report_failure, EXIT_CONFIGURATION, EXIT_OK};
use crate::config::load_config;
use crate::core::acquisition::load_image_file;
use crate::core::service::MedicationService;
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Label photo to read (JPEG, PNG, GIF, WebP, BMP or TIFF)
    #[arg(short, long)]
    pub image: PathBuf,

    /// Print the draft on a single line
    #[arg(long)]
    pub compact: bool,
}

impl ExtractArgs {
    /// Execute the extract command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(image = %self.image.display(), "Starting extract command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };

        let image = match load_image_file(&self.image, config.extraction.max_image_bytes).await {
            Ok(image) => image,
            Err(e) => return Ok(report_failure("Could not read the label photo", &e)),
        };

        let service = match MedicationService::from_config(&config, false).await {
            Ok(service) => service,
            Err(e) => return Ok(report_failure("Label scanning is not available", &e)),
        };

        let draft = match service
            .extract_from_image_with_cancel(&image, shutdown_signal)
            .await
        {
            Ok(draft) => draft,
            Err(e) => return Ok(report_failure("Label extraction failed", &e)),
        };

        let json = if self.compact {
            serde_json::to_string(&draft)?
        } else {
            serde_json::to_string_pretty(&draft)?
        };
        println!("{json}");

        Ok(EXIT_OK)
    }
}
