//! Record reconciliation
//!
//! Turns a draft, whether it came from a label or from manual entry, into a
//! [`MedicationRecord`] ready for insertion. Reconciliation owns the default
//! policy:
//!
//! - `name` and a positive `dosage_value` are mandatory
//! - unset units fall back to `mg` and `pills`
//! - blank instructions are stored as `None`
//! - `remaining_quantity` starts equal to `initial_quantity`
//!
//! Every call yields a new record with a fresh id; identical drafts are not
//! merged.

use crate::domain::medication::NewRecordFields;
use crate::domain::{
    DosageUnit, MedicationDraft, MedicationRecord, OwnerId, QuantityUnit, Result,
    ValidationErrors,
};
use chrono::{DateTime, Utc};

/// Checks the mandatory fields of a draft
///
/// Returns every failing field at once so an editing form can mark them all.
pub fn validate_draft(draft: &MedicationDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if draft.name.trim().is_empty() {
        errors.push("name", "Medication name is required");
    }

    match draft.dosage_value {
        None => errors.push("dosage_value", "Dosage is required"),
        Some(value) if !value.is_finite() || value <= 0.0 => {
            errors.push("dosage_value", "Dosage must be a positive number")
        }
        Some(_) => {}
    }

    errors
}

/// Builds the record to persist for `owner_id`, observed at `now`
///
/// # Errors
///
/// Returns [`MedscanError::Validation`](crate::domain::MedscanError::Validation)
/// listing the failing fields; nothing is created in that case.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use medscan::core::reconcile::reconcile;
/// use medscan::domain::{MedicationDraft, OwnerId};
///
/// let owner = OwnerId::new("7d44b88c-4199-4bad-97dc-d78268e01398").unwrap();
/// let draft = MedicationDraft::new("Amoxicillin")
///     .with_dosage(500.0, "mg")
///     .with_quantity(20, "capsules");
///
/// let record = reconcile(&draft, owner, Utc::now()).unwrap();
/// assert_eq!(record.remaining_quantity(), Some(20));
/// ```
pub fn reconcile(
    draft: &MedicationDraft,
    owner_id: OwnerId,
    now: DateTime<Utc>,
) -> Result<MedicationRecord> {
    validate_draft(draft).into_result()?;

    // Validation guarantees the dosage is present
    let dosage_value = draft.dosage_value.unwrap_or_default();

    let fields = NewRecordFields {
        name: draft.name.trim().to_string(),
        dosage_value,
        dosage_unit: unit_or_default(draft.dosage_unit.as_deref(), DosageUnit::default().as_str()),
        instructions: draft
            .instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        initial_quantity: draft.initial_quantity,
        quantity_unit: unit_or_default(
            draft.quantity_unit.as_deref(),
            QuantityUnit::default().as_str(),
        ),
    };

    let record = MedicationRecord::create(owner_id, fields, now);

    if !DosageUnit::is_known(record.dosage_unit()) || !QuantityUnit::is_known(record.quantity_unit())
    {
        tracing::debug!(
            medication_id = %record.id(),
            dosage_unit = record.dosage_unit(),
            quantity_unit = record.quantity_unit(),
            "Record uses a unit outside the standard vocabulary"
        );
    }

    Ok(record)
}

fn unit_or_default(unit: Option<&str>, default: &str) -> String {
    match unit {
        Some(unit) if !unit.trim().is_empty() => unit.to_string(),
        _ => default.to_string(),
    }
}
