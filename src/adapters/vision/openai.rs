//! OpenAI-compatible vision provider
//!
//! Calls `POST {base_url}/chat/completions` with a bearer credential. Any
//! server speaking the same schema (Azure OpenAI proxies, local gateways)
//! works by changing `extraction.base_url`.

use super::models::{
    ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart,
    ImageUrl,
};
use super::VisionProvider;
use crate::config::{secret_string, ExtractionConfig, SecretString};
use crate::core::acquisition::EncodedImage;
use crate::core::extraction::{EXTRACTION_INSTRUCTION, USER_PROMPT};
use crate::domain::{ExtractionServiceError, MedscanError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::{Duration, Instant};

/// Resolves the inference credential
///
/// An explicit `api_key` wins; otherwise the variable named by `api_key_env`
/// is read from the process environment at call time.
///
/// # Errors
///
/// Returns [`MedscanError::Configuration`] if neither source yields a
/// non-blank value.
pub fn resolve_api_key(config: &ExtractionConfig) -> Result<SecretString> {
    if let Some(ref key) = config.api_key {
        if !key.expose_secret().is_blank() {
            return Ok(key.clone());
        }
    }

    match std::env::var(&config.api_key_env) {
        Ok(value) if !value.trim().is_empty() => Ok(secret_string(value)),
        _ => Err(MedscanError::Configuration(format!(
            "Inference API key not configured: set {} or extraction.api_key",
            config.api_key_env
        ))),
    }
}

/// [`VisionProvider`] backed by an OpenAI-compatible chat completions API
///
/// # Example
///
/// ```no_run
/// use medscan::adapters::vision::OpenAiVisionProvider;
/// use medscan::config::ExtractionConfig;
///
/// let provider = OpenAiVisionProvider::new(ExtractionConfig::default()).unwrap();
/// ```
pub struct OpenAiVisionProvider {
    client: Client,
    config: ExtractionConfig,
}

impl OpenAiVisionProvider {
    /// Creates a provider; no credential is needed yet
    ///
    /// # Errors
    ///
    /// Returns [`MedscanError::Configuration`] if the HTTP client cannot be built.
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .build()
            .map_err(|e| {
                MedscanError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    fn build_request<'a>(&'a self, image: &'a EncodedImage) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage::System {
                    content: EXTRACTION_INSTRUCTION,
                },
                ChatMessage::User {
                    content: vec![
                        ContentPart::Text { text: USER_PROMPT },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image.data_uri(),
                            },
                        },
                    ],
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl VisionProvider for OpenAiVisionProvider {
    async fn read_label(&self, image: &EncodedImage) -> Result<String> {
        if image.byte_len() == 0 {
            return Err(MedscanError::Input("No image provided".to_string()));
        }

        let api_key = resolve_api_key(&self.config)?;
        let token: &str = api_key.expose_secret().as_ref();
        let url = self.config.completions_url();
        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&self.build_request(image))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionServiceError::Timeout(format!(
                        "no response within {}s",
                        self.config.timeout_seconds
                    ))
                } else {
                    ExtractionServiceError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        status = status.as_u16(),
                        error = %e,
                        "Failed to read inference error body"
                    );
                    String::new()
                }
            };
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                model = %self.config.model,
                "Inference service returned an error"
            );
            return Err(status_error(status, &body).into());
        }

        let completion: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| ExtractionServiceError::InvalidResponse(e.to_string()))?;

        let text = completion
            .first_text()
            .filter(|text| !text.trim().is_empty())
            .ok_or(ExtractionServiceError::EmptyCompletion)?;

        tracing::debug!(
            model = %self.config.model,
            duration_ms = start.elapsed().as_millis() as u64,
            response_chars = text.len(),
            "Inference service responded"
        );

        Ok(text)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Maps a non-success status onto the service error taxonomy
fn status_error(status: StatusCode, body: &str) -> ExtractionServiceError {
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("no response body").to_string()
    } else {
        serde_json::from_str::<ApiErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string())
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => ExtractionServiceError::RateLimited(message),
        s if s.is_server_error() => ExtractionServiceError::ServerError {
            status: s.as_u16(),
            message,
        },
        s if s.is_client_error() => ExtractionServiceError::ClientError {
            status: s.as_u16(),
            message,
        },
        s => ExtractionServiceError::InvalidResponse(format!("unexpected status {s}: {message}")),
    }
}
