//! Result type alias for medscan

use super::errors::MedscanError;

/// Result type alias for medscan operations
///
/// # Examples
///
/// ```
/// use medscan::domain::result::Result;
/// use medscan::domain::errors::MedscanError;
///
/// fn failing_function() -> Result<()> {
///     Err(MedscanError::Input("No image provided".to_string()))
/// }
///
/// assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, MedscanError>;
