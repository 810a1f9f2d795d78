//! Label extraction
//!
//! The prompt sent to the vision model and the parser that turns its free-form
//! reply into a [`MedicationDraft`](crate::domain::MedicationDraft).
//!
//! The instruction is a fixed contract: the model must answer with a single
//! JSON object using the field names below, use `null` for anything it cannot
//! read, and report the dosage as a bare number separate from its unit.

pub mod parser;

pub use parser::parse_extraction;

/// System instruction sent with every label image
pub const EXTRACTION_INSTRUCTION: &str = r#"You are a medication information extraction AI. Extract medication details from prescription/medication label images and return ONLY a JSON object with these exact fields:
{
  "name": "medication name",
  "dosage": number (extract numeric value only),
  "unit": "unit of measurement (mg, ml, etc.)",
  "instructions": "dosing instructions",
  "initial_quantity": number (total pills/amount if visible),
  "quantity_unit": "pills, ml, patches, etc."
}

If any field cannot be determined from the image, use null for that field. Be precise with dosage numbers."#;

/// Text part of the user message that accompanies the image
pub const USER_PROMPT: &str =
    "Extract medication information from this prescription/medication label:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_names_every_wire_field() {
        for field in [
            "\"name\"",
            "\"dosage\"",
            "\"unit\"",
            "\"instructions\"",
            "\"initial_quantity\"",
            "\"quantity_unit\"",
        ] {
            assert!(EXTRACTION_INSTRUCTION.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_instruction_requires_null_for_unreadable_fields() {
        assert!(EXTRACTION_INSTRUCTION.contains("use null for that field"));
        assert!(EXTRACTION_INSTRUCTION.contains("extract numeric value only"));
    }
}
