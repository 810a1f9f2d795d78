//! Core business logic for medscan.
//!
//! # Modules
//!
//! - [`acquisition`] - Label photo to transportable data URI
//! - [`extraction`] - Fixed instruction and the reply parser/validator
//! - [`reconcile`] - Draft to record, with default-value policy
//! - [`session`] - Add-medication interaction state machine
//! - [`service`] - Orchestration of extraction and persistence
//!
//! # Pipeline
//!
//! 1. **Acquire**: read the image, detect its format, encode it as a data URI
//! 2. **Extract**: send it with the fixed instruction, receive free-form text
//! 3. **Parse**: strict JSON object, required `name`, normalized optional fields
//! 4. **Review**: the user confirms or edits the draft
//! 5. **Reconcile**: check mandatory fields, apply defaults, derive the record
//! 6. **Save**: one atomic insert
//!
//! Any failure in steps 1 to 3 falls back to manual entry.
//!
//! # Example
//!
//! ```rust,no_run
//! use medscan::config::load_config;
//! use medscan::core::acquisition::load_image_file;
//! use medscan::core::service::MedicationService;
//! use medscan::domain::OwnerId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("medscan.toml")?;
//! let service = MedicationService::from_config(&config, true).await?;
//!
//! let image = load_image_file("label.jpg", config.extraction.max_image_bytes).await?;
//! let draft = service.extract_from_image(&image).await?;
//!
//! let owner = OwnerId::new("7d44b88c-4199-4bad-97dc-d78268e01398")?;
//! let id = service.reconcile_and_save(&draft, owner).await?;
//! println!("Saved {id}");
//! # Ok(())
//! # }
//! ```

pub mod acquisition;
pub mod extraction;
pub mod reconcile;
pub mod service;
pub mod session;
