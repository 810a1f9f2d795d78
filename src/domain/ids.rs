//! Domain identifier types with validation
//!
//! Newtype wrappers so medication and owner identifiers cannot be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Medication record identifier
///
/// Generated by reconciliation when a record is first created.
///
/// # Examples
///
/// ```
/// use medscan::domain::ids::MedicationId;
///
/// let a = MedicationId::generate();
/// let b = MedicationId::generate();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MedicationId(Uuid);

impl MedicationId {
    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID (e.g. one read back from storage)
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MedicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MedicationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid medication ID '{s}': {e}"))
    }
}

/// Owning user identifier
///
/// Supplied by the authentication collaborator; the core only requires it to
/// be a well-formed UUID.
///
/// # Examples
///
/// ```
/// use medscan::domain::ids::OwnerId;
/// use std::str::FromStr;
///
/// let owner = OwnerId::from_str("7d44b88c-4199-4bad-97dc-d78268e01398").unwrap();
/// assert_eq!(owner.to_string(), "7d44b88c-4199-4bad-97dc-d78268e01398");
/// assert!(OwnerId::from_str("").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Creates an owner ID from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is blank or not a UUID
    pub fn new(id: impl AsRef<str>) -> Result<Self, String> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err("Owner ID cannot be empty".to_string());
        }
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|e| format!("Invalid owner ID '{id}': {e}"))
    }

    /// Wraps an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OwnerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
