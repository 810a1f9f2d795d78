//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output
//! - JSON-formatted log files with daily or hourly rotation
//! - Configurable log levels
//!
//! Image bytes, API keys and database passwords are never logged. Images are
//! identified by their SHA-256 fingerprint instead.
//!
//! # Example
//!
//! ```no_run
//! use medscan::logging::init_logging;
//! use medscan::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! // Use tracing macros for logging
//! tracing::info!("Application started");
//! tracing::error!(error = "Something went wrong", "Error occurred");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a label extraction
///
/// # Example
///
/// ```no_run
/// use medscan::log_extraction_start;
/// use medscan::core::acquisition::load_image_file;
///
/// # async fn run() -> medscan::domain::Result<()> {
/// let image = load_image_file("label.jpg", 10 * 1024 * 1024).await?;
/// log_extraction_start!(&image, "gpt-4o-mini");
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! log_extraction_start {
    ($image:expr, $model:expr) => {
        tracing::info!(
            image_fingerprint = %$image.fingerprint(),
            image_format = %$image.format(),
            image_bytes = $image.byte_len(),
            model = %$model,
            "Starting label extraction"
        );
    };
}

/// Log the completion of a label extraction
///
/// # Example
///
/// ```no_run
/// use medscan::log_extraction_complete;
/// use medscan::domain::MedicationDraft;
/// use std::time::Duration;
///
/// let draft = MedicationDraft::new("Amoxicillin");
/// let duration = Duration::from_millis(1830);
/// log_extraction_complete!(&draft, duration);
/// ```
#[macro_export]
macro_rules! log_extraction_complete {
    ($draft:expr, $duration:expr) => {
        tracing::info!(
            has_dosage = $draft.dosage_value.is_some(),
            has_quantity = $draft.initial_quantity.is_some(),
            duration_ms = $duration.as_millis() as u64,
            "Label extraction completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use medscan::log_error_with_context;
/// use medscan::domain::MedscanError;
///
/// let error = MedscanError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
