//! CLI command implementations
//!
//! This module contains all CLI command implementations and the mapping from
//! error class to process exit code.

pub mod add;
pub mod extract;
pub mod init;
pub mod validate;

use crate::domain::MedscanError;
use crate::log_error_with_context;

/// Successful run
pub const EXIT_OK: i32 = 0;
/// Configuration missing or invalid
pub const EXIT_CONFIGURATION: i32 = 2;
/// Unusable image or a draft that failed validation
pub const EXIT_INPUT: i32 = 3;
/// The inference service failed or replied with something unusable
pub const EXIT_EXTRACTION: i32 = 4;
/// Persistence and other fatal failures
pub const EXIT_FATAL: i32 = 5;

/// Exit code for an error class
pub fn exit_code_for(error: &MedscanError) -> i32 {
    match error {
        MedscanError::Configuration(_) => EXIT_CONFIGURATION,
        MedscanError::Input(_) | MedscanError::Validation(_) => EXIT_INPUT,
        MedscanError::ExtractionService(_)
        | MedscanError::MalformedResponse(_)
        | MedscanError::IncompleteExtraction(_) => EXIT_EXTRACTION,
        MedscanError::Persistence(_) | MedscanError::Io(_) | MedscanError::Serialization(_) => {
            EXIT_FATAL
        }
    }
}

/// Prints a failure the way every command does and returns its exit code
fn report_failure(headline: &str, error: &MedscanError) -> i32 {
    log_error_with_context!(error, headline);
    println!("❌ {headline}");
    println!("   {}", error.user_message());
    println!("   Error: {error}");
    exit_code_for(error)
}
