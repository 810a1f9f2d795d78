//! Configuration management for medscan.
//!
//! medscan reads a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `MEDSCAN_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use medscan::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("medscan.toml")?;
//!
//! println!("Inference endpoint: {}", config.extraction.completions_url());
//! println!("Model: {}", config.extraction.model);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [extraction]
//! model = "gpt-4o-mini"
//! timeout_seconds = 30
//! api_key_env = "OPENAI_API_KEY"
//!
//! [postgresql]
//! connection_string = "${MEDSCAN_DATABASE_URL}"
//! ```
//!
//! The inference API key is resolved when a request is made, never at load
//! time, so a missing key only disables label scanning.

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, Environment, ExtractionConfig, LoggingConfig, MedscanConfig,
    PostgreSQLConfig,
};
pub use secret::{redact_url_credentials, secret_string, SecretString, SecretValue};
