//! Domain error types
//!
//! This module defines the error hierarchy for medscan. Every failure the
//! extraction pipeline can produce maps onto one variant of [`MedscanError`],
//! and no variant exposes third-party types.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Main medscan error type
///
/// One variant per failure class of the add-medication flow, plus plumbing
/// variants for I/O and serialization.
#[derive(Debug, Error)]
pub enum MedscanError {
    /// No image was supplied, or the supplied bytes are not a decodable image
    #[error("Input error: {0}")]
    Input(String),

    /// Deployment/configuration problem (missing credential, bad config file)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The inference service could not be reached or answered with a failure
    #[error("Extraction service error: {0}")]
    ExtractionService(#[from] ExtractionServiceError),

    /// The service replied but the text is not a flat JSON object
    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    /// The reply parsed but carries no usable medication name
    #[error("Incomplete extraction: {0}")]
    IncompleteExtraction(String),

    /// A draft failed the mandatory-field check before save
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// The storage collaborator rejected the write
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MedscanError {
    /// Whether the user can recover by retrying or by entering details manually
    ///
    /// Configuration problems are fatal for the process; everything the user
    /// can act on is recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MedscanError::Configuration(_) | MedscanError::Io(_) => false,
            MedscanError::ExtractionService(e) => e.is_retryable(),
            _ => true,
        }
    }

    /// Whether the flow should offer the manual-entry path after this error
    pub fn offers_manual_entry(&self) -> bool {
        matches!(
            self,
            MedscanError::Input(_)
                | MedscanError::ExtractionService(_)
                | MedscanError::MalformedResponse(_)
                | MedscanError::IncompleteExtraction(_)
        )
    }

    /// Short message suitable for showing to the person adding a medication
    pub fn user_message(&self) -> String {
        match self {
            MedscanError::Input(msg) => format!("The selected file could not be used: {msg}"),
            MedscanError::Configuration(_) => {
                "Label scanning is not available right now. Please enter the details manually."
                    .to_string()
            }
            MedscanError::ExtractionService(ExtractionServiceError::Cancelled) => {
                "Label scanning was cancelled.".to_string()
            }
            MedscanError::ExtractionService(ExtractionServiceError::Timeout(_)) => {
                "Reading the label took too long. Please try again or enter details manually."
                    .to_string()
            }
            MedscanError::ExtractionService(_) => {
                "Could not extract medication information from the image. Please try again or enter details manually."
                    .to_string()
            }
            MedscanError::MalformedResponse(_) => {
                "Failed to parse medication information from image. Please try again or enter details manually."
                    .to_string()
            }
            MedscanError::IncompleteExtraction(_) => {
                "Could not extract medication name from image. Please enter details manually."
                    .to_string()
            }
            MedscanError::Validation(errors) => errors.to_string(),
            MedscanError::Persistence(_) => "Failed to save medication.".to_string(),
            MedscanError::Io(_) | MedscanError::Serialization(_) => {
                "An unexpected error occurred.".to_string()
            }
        }
    }
}

/// Inference service errors
///
/// Errors that occur when calling the external multimodal completion service.
/// None of these are retried in-process.
#[derive(Debug, Error)]
pub enum ExtractionServiceError {
    /// Failed to reach the service
    #[error("Failed to connect to inference service: {0}")]
    ConnectionFailed(String),

    /// The bounded request timeout expired
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The caller abandoned the request
    #[error("Request cancelled")]
    Cancelled,

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx other than 429)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// The response envelope could not be decoded
    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),

    /// The envelope decoded but held no completion text
    #[error("Service returned no completion text")]
    EmptyCompletion,
}

impl ExtractionServiceError {
    /// Whether another attempt by the user could succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ExtractionServiceError::ClientError { status, .. } if *status == 401 || *status == 403)
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Draft field the message refers to
    pub field: &'static str,

    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    /// Creates a new field error
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Collection of field errors produced by draft validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Returns true when no field failed
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// All recorded failures, in insertion order
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Returns the message for a specific field, if it failed
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Converts into `Ok(())` when empty, otherwise a validation error
    pub fn into_result(self) -> Result<(), MedscanError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(MedscanError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for MedscanError {
    fn from(err: std::io::Error) -> Self {
        MedscanError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for MedscanError {
    fn from(err: serde_json::Error) -> Self {
        MedscanError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for MedscanError {
    fn from(err: toml::de::Error) -> Self {
        MedscanError::Configuration(format!("TOML parse error: {err}"))
    }
}
