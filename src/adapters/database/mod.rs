//! Storage abstraction layer
//!
//! This module provides a trait-based abstraction for persisting medication
//! records, so the service can run against PostgreSQL in production and an
//! in-memory double in tests.

pub mod factory;
pub mod traits;

pub use factory::create_medication_store;
pub use traits::MedicationStore;
