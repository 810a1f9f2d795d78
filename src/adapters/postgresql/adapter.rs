//! PostgreSQL adapter implementing the storage trait
//!
//! This module provides the implementation of [`MedicationStore`] for
//! PostgreSQL.

use crate::adapters::database::traits::MedicationStore;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::PostgreSQLMedication;
use crate::domain::{MedicationId, MedicationRecord, MedscanError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// PostgreSQL implementation of [`MedicationStore`]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Create a new PostgreSQL adapter with an Arc-wrapped client
    pub fn new_with_arc(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

#[async_trait]
impl MedicationStore for PostgreSQLAdapter {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    async fn insert_medication(
        &self,
        record: &MedicationRecord,
        dry_run: bool,
    ) -> Result<MedicationId> {
        let row = PostgreSQLMedication::from_domain(record)?;

        if dry_run {
            tracing::info!(
                medication_id = %record.id(),
                owner_id = %record.owner_id(),
                "DRY RUN: Would insert medication into PostgreSQL"
            );
            return Ok(record.id());
        }

        // A single INSERT is atomic: the row is stored in full or not at all
        let returned = self
            .client
            .query_one(
                PostgreSQLMedication::INSERT,
                &[
                    &row.id,
                    &row.owner_id,
                    &row.name,
                    &row.dosage_value,
                    &row.dosage_unit,
                    &row.instructions,
                    &row.initial_quantity,
                    &row.remaining_quantity,
                    &row.quantity_unit,
                    &row.created_at,
                    &row.updated_at,
                ],
            )
            .await?;

        let id: Uuid = returned.try_get("id").map_err(|e| {
            MedscanError::Persistence(format!("Insert did not return an id: {e}"))
        })?;

        tracing::info!(
            medication_id = %id,
            owner_id = %record.owner_id(),
            "Medication stored"
        );

        Ok(MedicationId::from_uuid(id))
    }

    fn backend_name(&self) -> &str {
        "postgresql"
    }
}
