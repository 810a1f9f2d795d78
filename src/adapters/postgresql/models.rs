//! PostgreSQL row models
//!
//! This module defines the row structure used when storing medication records
//! in PostgreSQL.

use crate::domain::{MedicationRecord, MedscanError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Medication row for PostgreSQL storage
///
/// This structure maps to the `medications` table. Quantities are stored as
/// `INTEGER`, so values above `i32::MAX` are rejected before the write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostgreSQLMedication {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub dosage_value: f64,
    pub dosage_unit: String,
    pub instructions: Option<String>,
    pub initial_quantity: Option<i32>,
    pub remaining_quantity: Option<i32>,
    pub quantity_unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostgreSQLMedication {
    /// Insert statement; the generated id is returned by the database
    pub const INSERT: &'static str = r#"
        INSERT INTO medications (
            id, owner_id, name, dosage_value, dosage_unit, instructions,
            initial_quantity, remaining_quantity, quantity_unit, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
    "#;

    /// Convert from a domain record
    ///
    /// # Errors
    ///
    /// Returns [`MedscanError::Persistence`] if a quantity does not fit the
    /// column type.
    pub fn from_domain(record: &MedicationRecord) -> Result<Self> {
        Ok(Self {
            id: *record.id().as_uuid(),
            owner_id: *record.owner_id().as_uuid(),
            name: record.name().to_string(),
            dosage_value: record.dosage_value(),
            dosage_unit: record.dosage_unit().to_string(),
            instructions: record.instructions().map(str::to_string),
            initial_quantity: to_column(record.initial_quantity(), "initial_quantity")?,
            remaining_quantity: to_column(record.remaining_quantity(), "remaining_quantity")?,
            quantity_unit: record.quantity_unit().to_string(),
            created_at: record.created_at(),
            updated_at: record.updated_at(),
        })
    }
}

fn to_column(value: Option<u32>, column: &str) -> Result<Option<i32>> {
    value
        .map(|v| {
            i32::try_from(v).map_err(|_| {
                MedscanError::Persistence(format!("{column} {v} exceeds the storable range"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reconcile::reconcile;
    use crate::domain::{MedicationDraft, OwnerId};

    fn owner() -> OwnerId {
        OwnerId::new("7d44b88c-4199-4bad-97dc-d78268e01398").unwrap()
    }

    #[test]
    fn test_from_domain() {
        let draft = MedicationDraft::new("Amoxicillin")
            .with_dosage(500.0, "mg")
            .with_instructions("Take twice daily")
            .with_quantity(20, "capsules");
        let record = reconcile(&draft, owner(), Utc::now()).unwrap();

        let row = PostgreSQLMedication::from_domain(&record).unwrap();
        assert_eq!(row.id, *record.id().as_uuid());
        assert_eq!(row.owner_id, *owner().as_uuid());
        assert_eq!(row.name, "Amoxicillin");
        assert_eq!(row.initial_quantity, Some(20));
        assert_eq!(row.remaining_quantity, Some(20));
        assert_eq!(row.instructions.as_deref(), Some("Take twice daily"));
        assert_eq!(row.created_at, row.updated_at);
    }

    #[test]
    fn test_quantity_out_of_column_range() {
        let draft = MedicationDraft::new("Saline")
            .with_dosage(1.0, "ml")
            .with_quantity(u32::MAX, "ml");
        let record = reconcile(&draft, owner(), Utc::now()).unwrap();

        let result = PostgreSQLMedication::from_domain(&record);
        assert!(matches!(result, Err(MedscanError::Persistence(_))));
    }
}
