//! Multimodal inference adapter
//!
//! The [`VisionProvider`] trait is the seam between the extraction service and
//! the outside world; [`OpenAiVisionProvider`] is the production
//! implementation.

pub mod models;
pub mod openai;
pub mod provider;

pub use openai::{resolve_api_key, OpenAiVisionProvider};
pub use provider::VisionProvider;
