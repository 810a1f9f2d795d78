//! Storage abstraction traits
//!
//! This module defines the trait that storage adapters must implement to
//! persist medication records.

use crate::domain::{MedicationId, MedicationRecord, Result};
use async_trait::async_trait;

/// Storage for medication records
///
/// The core only ever inserts: updates and deletes belong to other flows.
/// Implementations must make each insert atomic, so a record is either fully
/// stored or not at all.
#[async_trait]
pub trait MedicationStore: Send + Sync {
    /// Test the storage connection
    ///
    /// # Errors
    ///
    /// Returns an error if the connection test fails.
    async fn test_connection(&self) -> Result<()>;

    /// Ensure the medications table exists, creating it if necessary
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    async fn ensure_schema(&self) -> Result<()>;

    /// Insert a new record
    ///
    /// # Arguments
    ///
    /// * `record` - Reconciled record to store
    /// * `dry_run` - If true, skip the actual write and return the record's id
    ///
    /// # Returns
    ///
    /// The id stored for the record.
    ///
    /// # Errors
    ///
    /// Returns [`MedscanError::Persistence`](crate::domain::MedscanError::Persistence)
    /// if the write is rejected.
    async fn insert_medication(
        &self,
        record: &MedicationRecord,
        dry_run: bool,
    ) -> Result<MedicationId>;

    /// Short backend name for logs
    fn backend_name(&self) -> &str;
}
