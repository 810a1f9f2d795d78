//! Medication domain models
//!
//! [`MedicationDraft`] is the transient field set produced by label extraction
//! or manual entry. [`MedicationRecord`] is the persisted entity created from a
//! draft by reconciliation.

use super::ids::{MedicationId, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dosage units offered by the entry form
///
/// Advisory only: drafts carry the unit as free text so any clinically valid
/// token read from a label survives untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DosageUnit {
    #[default]
    Mg,
    G,
    Ml,
    Mcg,
    Units,
}

impl DosageUnit {
    /// Every unit, in form order
    pub const ALL: [DosageUnit; 5] = [
        DosageUnit::Mg,
        DosageUnit::G,
        DosageUnit::Ml,
        DosageUnit::Mcg,
        DosageUnit::Units,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DosageUnit::Mg => "mg",
            DosageUnit::G => "g",
            DosageUnit::Ml => "ml",
            DosageUnit::Mcg => "mcg",
            DosageUnit::Units => "units",
        }
    }

    /// Whether `unit` is one of the form's known tokens (case-insensitive)
    pub fn is_known(unit: &str) -> bool {
        unit.parse::<DosageUnit>().is_ok()
    }
}

impl fmt::Display for DosageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DosageUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        DosageUnit::ALL
            .into_iter()
            .find(|u| u.as_str() == lowered)
            .ok_or_else(|| format!("Unknown dosage unit: {s}"))
    }
}

/// Quantity units offered by the entry form (advisory, like [`DosageUnit`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuantityUnit {
    #[default]
    Pills,
    Tablets,
    Capsules,
    Ml,
    Patches,
    Doses,
}

impl QuantityUnit {
    /// Every unit, in form order
    pub const ALL: [QuantityUnit; 6] = [
        QuantityUnit::Pills,
        QuantityUnit::Tablets,
        QuantityUnit::Capsules,
        QuantityUnit::Ml,
        QuantityUnit::Patches,
        QuantityUnit::Doses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityUnit::Pills => "pills",
            QuantityUnit::Tablets => "tablets",
            QuantityUnit::Capsules => "capsules",
            QuantityUnit::Ml => "ml",
            QuantityUnit::Patches => "patches",
            QuantityUnit::Doses => "doses",
        }
    }

    /// Whether `unit` is one of the form's known tokens (case-insensitive)
    pub fn is_known(unit: &str) -> bool {
        unit.parse::<QuantityUnit>().is_ok()
    }
}

impl fmt::Display for QuantityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuantityUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        QuantityUnit::ALL
            .into_iter()
            .find(|u| u.as_str() == lowered)
            .ok_or_else(|| format!("Unknown quantity unit: {s}"))
    }
}

/// Medication fields before persistence
///
/// Both the label parser and manual entry produce this shape. Fields the
/// label did not reveal stay `None`; the name may still be blank while the
/// user is typing, which reconciliation rejects.
///
/// # Examples
///
/// ```
/// use medscan::domain::MedicationDraft;
///
/// let draft = MedicationDraft::new("Amoxicillin")
///     .with_dosage(500.0, "mg")
///     .with_quantity(20, "capsules");
///
/// assert_eq!(draft.name, "Amoxicillin");
/// assert_eq!(draft.dosage_value, Some(500.0));
/// assert_eq!(draft.initial_quantity, Some(20));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MedicationDraft {
    /// Medication name
    pub name: String,

    /// Numeric dosage strength (positive when present)
    pub dosage_value: Option<f64>,

    /// Dosage unit token, e.g. "mg"
    pub dosage_unit: Option<String>,

    /// Free-text dosing instructions
    pub instructions: Option<String>,

    /// Total amount dispensed
    pub initial_quantity: Option<u32>,

    /// Unit of the dispensed amount, e.g. "pills"
    pub quantity_unit: Option<String>,
}

impl MedicationDraft {
    /// Creates a draft holding only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Blank draft pre-filled with the entry form's default units
    pub fn manual() -> Self {
        Self {
            dosage_unit: Some(DosageUnit::default().to_string()),
            quantity_unit: Some(QuantityUnit::default().to_string()),
            ..Default::default()
        }
    }

    /// Sets dosage value and unit
    pub fn with_dosage(mut self, value: f64, unit: impl Into<String>) -> Self {
        self.dosage_value = Some(value);
        self.dosage_unit = Some(unit.into());
        self
    }

    /// Sets instructions
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Sets initial quantity and its unit
    pub fn with_quantity(mut self, quantity: u32, unit: impl Into<String>) -> Self {
        self.initial_quantity = Some(quantity);
        self.quantity_unit = Some(unit.into());
        self
    }
}

/// Persisted medication entity
///
/// Records are only created through reconciliation, which guarantees a
/// non-empty name, a positive dosage and `remaining_quantity` equal to
/// `initial_quantity`. The initial quantity has no setter.
///
/// Records serialize for output but cannot be deserialized, since that
/// would build one without reconciliation:
///
/// ```compile_fail
/// let record: medscan::domain::MedicationRecord =
///     serde_json::from_str(r#"{"name": "", "dosage_value": -3.0}"#).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicationRecord {
    id: MedicationId,
    owner_id: OwnerId,
    name: String,
    dosage_value: f64,
    dosage_unit: String,
    instructions: Option<String>,
    initial_quantity: Option<u32>,
    remaining_quantity: Option<u32>,
    quantity_unit: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Field values for a new record, assembled by reconciliation
#[derive(Debug, Clone)]
pub(crate) struct NewRecordFields {
    pub name: String,
    pub dosage_value: f64,
    pub dosage_unit: String,
    pub instructions: Option<String>,
    pub initial_quantity: Option<u32>,
    pub quantity_unit: String,
}

impl MedicationRecord {
    /// Creates a record observed for the first time at `now`
    pub(crate) fn create(owner_id: OwnerId, fields: NewRecordFields, now: DateTime<Utc>) -> Self {
        Self {
            id: MedicationId::generate(),
            owner_id,
            name: fields.name,
            dosage_value: fields.dosage_value,
            dosage_unit: fields.dosage_unit,
            instructions: fields.instructions,
            initial_quantity: fields.initial_quantity,
            remaining_quantity: fields.initial_quantity,
            quantity_unit: fields.quantity_unit,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> MedicationId {
        self.id
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dosage_value(&self) -> f64 {
        self.dosage_value
    }

    pub fn dosage_unit(&self) -> &str {
        &self.dosage_unit
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn initial_quantity(&self) -> Option<u32> {
        self.initial_quantity
    }

    pub fn remaining_quantity(&self) -> Option<u32> {
        self.remaining_quantity
    }

    pub fn quantity_unit(&self) -> &str {
        &self.quantity_unit
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True when every user-supplied field matches `other`, ignoring identity
    /// and timestamps
    pub fn same_fields_as(&self, other: &MedicationRecord) -> bool {
        self.owner_id == other.owner_id
            && self.name == other.name
            && self.dosage_value == other.dosage_value
            && self.dosage_unit == other.dosage_unit
            && self.instructions == other.instructions
            && self.initial_quantity == other.initial_quantity
            && self.remaining_quantity == other.remaining_quantity
            && self.quantity_unit == other.quantity_unit
    }
}
