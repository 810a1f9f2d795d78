//! Parser and validator for extraction replies
//!
//! Parsing runs in three steps:
//!
//! 1. Strict decode: the whole reply must be one JSON object whose label
//!    fields hold single values. Prose, code fences, arrays and a label field
//!    holding an array or object are [`MedscanError::MalformedResponse`].
//!    Other keys are ignored whatever they hold.
//! 2. Required field: `name` must be a string that is non-empty after
//!    trimming, otherwise [`MedscanError::IncompleteExtraction`] and nothing
//!    else from the reply is kept.
//! 3. Normalization: optional fields that do not have the expected shape
//!    become `None`; they never fail the parse.

use crate::domain::{MedicationDraft, MedscanError, Result};
use serde::Deserialize;
use serde_json::{Map, Number, Value};

/// A JSON scalar as the model may emit it
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(Number),
    Flag(bool),
}

/// Keys of [`LabelFields`]
const LABEL_FIELDS: [&str; 6] = [
    "name",
    "dosage",
    "unit",
    "instructions",
    "initial_quantity",
    "quantity_unit",
];

/// Wire shape of the reply; unknown keys are ignored
#[derive(Debug, Deserialize)]
struct LabelFields {
    #[serde(default)]
    name: Option<Scalar>,
    #[serde(default)]
    dosage: Option<Scalar>,
    #[serde(default)]
    unit: Option<Scalar>,
    #[serde(default)]
    instructions: Option<Scalar>,
    #[serde(default)]
    initial_quantity: Option<Scalar>,
    #[serde(default)]
    quantity_unit: Option<Scalar>,
}

/// Parses the raw completion text into a draft
///
/// # Errors
///
/// - [`MedscanError::MalformedResponse`] if `raw` is not a JSON object or a
///   label field holds an array or object
/// - [`MedscanError::IncompleteExtraction`] if the object has no usable `name`
///
/// # Examples
///
/// ```
/// use medscan::core::extraction::parse_extraction;
///
/// let draft = parse_extraction(
///     r#"{"name":"Amoxicillin","dosage":500,"unit":"mg","instructions":"Take twice daily","initial_quantity":20,"quantity_unit":"capsules"}"#,
/// ).unwrap();
///
/// assert_eq!(draft.name, "Amoxicillin");
/// assert_eq!(draft.dosage_value, Some(500.0));
/// assert_eq!(draft.initial_quantity, Some(20));
///
/// assert!(parse_extraction("Sorry, I cannot read this label.").is_err());
/// ```
pub fn parse_extraction(raw: &str) -> Result<MedicationDraft> {
    let object = decode_flat_object(raw)?;

    let fields: LabelFields = serde_json::from_value(Value::Object(object)).map_err(|e| {
        MedscanError::MalformedResponse(format!("Reply does not match the label schema: {e}"))
    })?;

    let name = match fields.name {
        Some(Scalar::Text(ref name)) if !name.trim().is_empty() => name.trim().to_string(),
        Some(Scalar::Text(_)) => {
            return Err(MedscanError::IncompleteExtraction(
                "Medication name is blank".to_string(),
            ))
        }
        Some(_) => {
            return Err(MedscanError::IncompleteExtraction(
                "Medication name is not text".to_string(),
            ))
        }
        None => {
            return Err(MedscanError::IncompleteExtraction(
                "Medication name is missing".to_string(),
            ))
        }
    };

    let draft = MedicationDraft {
        name,
        dosage_value: fields.dosage.as_ref().and_then(positive_number),
        dosage_unit: fields.unit.and_then(non_blank_text),
        instructions: fields.instructions.and_then(non_blank_text),
        initial_quantity: fields.initial_quantity.as_ref().and_then(whole_quantity),
        quantity_unit: fields.quantity_unit.and_then(non_blank_text),
    };

    tracing::debug!(
        has_dosage = draft.dosage_value.is_some(),
        has_unit = draft.dosage_unit.is_some(),
        has_instructions = draft.instructions.is_some(),
        has_quantity = draft.initial_quantity.is_some(),
        "Extraction reply parsed"
    );

    Ok(draft)
}

/// Decodes `raw` and checks that every label field present is a scalar
fn decode_flat_object(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|e| {
        MedscanError::MalformedResponse(format!("Reply is not valid JSON: {e}"))
    })?;

    let object = match value {
        Value::Object(object) => object,
        Value::Array(_) => {
            return Err(MedscanError::MalformedResponse(
                "Expected a JSON object, got an array".to_string(),
            ))
        }
        other => {
            return Err(MedscanError::MalformedResponse(format!(
                "Expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    if let Some((key, value)) = object
        .iter()
        .filter(|(k, _)| LABEL_FIELDS.contains(&k.as_str()))
        .find(|(_, v)| matches!(v, Value::Array(_) | Value::Object(_)))
    {
        return Err(MedscanError::MalformedResponse(format!(
            "Field '{key}' holds {} instead of a single value",
            json_kind(value)
        )));
    }

    Ok(object)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Dosage strength: positive and finite, from a number or a numeric string
fn positive_number(value: &Scalar) -> Option<f64> {
    let number = match value {
        Scalar::Number(n) => n.as_f64()?,
        Scalar::Text(s) => s.trim().parse::<f64>().ok()?,
        Scalar::Flag(_) => return None,
    };

    (number.is_finite() && number > 0.0).then_some(number)
}

/// Dispensed amount: a whole, non-negative count that fits in `u32`
fn whole_quantity(value: &Scalar) -> Option<u32> {
    let number = match value {
        Scalar::Number(n) => {
            if let Some(whole) = n.as_u64() {
                return u32::try_from(whole).ok();
            }
            n.as_f64()?
        }
        Scalar::Text(s) => s.trim().parse::<f64>().ok()?,
        Scalar::Flag(_) => return None,
    };

    if number.is_finite() && number >= 0.0 && number.fract() == 0.0 && number <= f64::from(u32::MAX)
    {
        Some(number as u32)
    } else {
        None
    }
}

/// Passes text through unchanged; blank text and non-text become `None`
fn non_blank_text(value: Scalar) -> Option<String> {
    match value {
        Scalar::Text(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}
