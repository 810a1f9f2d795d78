//! Domain models and types for medscan.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`MedicationId`], [`OwnerId`])
//! - **Domain models** ([`MedicationDraft`], [`MedicationRecord`])
//! - **Advisory unit vocabularies** ([`DosageUnit`], [`QuantityUnit`])
//! - **Error types** ([`MedscanError`], [`ExtractionServiceError`], [`ValidationErrors`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, MedscanError>`]:
//!
//! ```rust
//! use medscan::domain::{MedscanError, Result};
//!
//! fn example(encoded: &str) -> Result<()> {
//!     if encoded.is_empty() {
//!         return Err(MedscanError::Input("No image provided".to_string()));
//!     }
//!     Ok(())
//! }
//! # assert!(example("").is_err());
//! ```

pub mod errors;
pub mod ids;
pub mod medication;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{ExtractionServiceError, FieldError, MedscanError, ValidationErrors};
pub use ids::{MedicationId, OwnerId};
pub use medication::{DosageUnit, MedicationDraft, MedicationRecord, QuantityUnit};
pub use result::Result;
