// Medscan - Medication label extraction pipeline
// Copyright (c) 2025 Medscan Contributors
// Licensed under the MIT License

//! # medscan - medication label extraction
//!
//! medscan turns a photo of a prescription or medication label into a
//! validated medication record. A vision-capable completion service reads the
//! label, the reply is parsed into a draft, the user reviews it, and the
//! reconciled record is stored in PostgreSQL.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Acquisition, extraction parsing, reconciliation, session, service
//! - [`adapters`] - External integrations (inference service, PostgreSQL)
//! - [`domain`] - Draft and record types, identifiers, errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use medscan::config::load_config;
//! use medscan::core::acquisition::load_image_file;
//! use medscan::core::service::MedicationService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("medscan.toml")?;
//!     let service = MedicationService::from_config(&config, false).await?;
//!
//!     let image = load_image_file("label.jpg", config.extraction.max_image_bytes).await?;
//!     let draft = service.extract_from_image(&image).await?;
//!
//!     println!("{}", serde_json::to_string_pretty(&draft)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Parsing Without a Service
//!
//! The reply parser is pure and can be used on its own:
//!
//! ```rust
//! use medscan::core::extraction::parse_extraction;
//!
//! let draft = parse_extraction(r#"{"name": "Amoxicillin", "dosage": 500, "unit": "mg"}"#)
//!     .unwrap();
//! assert_eq!(draft.name, "Amoxicillin");
//! assert_eq!(draft.dosage_value, Some(500.0));
//!
//! assert!(parse_extraction("I see a bottle of pills").is_err());
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`], whose error type
//! [`domain::MedscanError`] has one variant per failure class. Every class
//! carries a message suitable for the person adding the medication:
//!
//! ```rust
//! use medscan::core::extraction::parse_extraction;
//!
//! let error = parse_extraction(r#"{"dosage": 500}"#).unwrap_err();
//! assert!(error.offers_manual_entry());
//! println!("{}", error.user_message());
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
