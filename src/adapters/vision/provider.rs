//! Vision provider trait definition
//!
//! This module defines the `VisionProvider` trait that abstracts the external
//! multimodal completion service. The service layer only ever sees the raw
//! completion text; interpreting it is the parser's job.

use crate::core::acquisition::EncodedImage;
use crate::domain::Result;
use async_trait::async_trait;

/// Trait for multimodal inference backends
///
/// Implementations send one label image together with the fixed extraction
/// instruction and return the first completion's text verbatim. They never
/// retry: transient failures surface as
/// [`ExtractionServiceError`](crate::domain::ExtractionServiceError).
///
/// # Example
///
/// ```no_run
/// use medscan::adapters::vision::{OpenAiVisionProvider, VisionProvider};
/// use medscan::config::ExtractionConfig;
/// use medscan::core::acquisition::load_image_file;
///
/// # async fn example() -> medscan::domain::Result<()> {
/// let config = ExtractionConfig::default();
/// let provider = OpenAiVisionProvider::new(config.clone())?;
///
/// let image = load_image_file("label.jpg", config.max_image_bytes).await?;
/// let text = provider.read_label(&image).await?;
/// println!("{text}");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Sends `image` for extraction and returns the raw completion text
    ///
    /// # Errors
    ///
    /// - [`MedscanError::Configuration`](crate::domain::MedscanError::Configuration)
    ///   if no credential is available; no request is made in that case
    /// - [`MedscanError::ExtractionService`](crate::domain::MedscanError::ExtractionService)
    ///   for transport failures, non-success statuses and empty completions
    async fn read_label(&self, image: &EncodedImage) -> Result<String>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}
