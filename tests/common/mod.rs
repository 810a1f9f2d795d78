//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use medscan::adapters::database::MedicationStore;
use medscan::adapters::vision::OpenAiVisionProvider;
use medscan::config::{secret_string, ExtractionConfig};
use medscan::core::service::MedicationService;
use medscan::domain::{MedicationId, MedicationRecord, MedscanError, OwnerId, Result};
use serde_json::json;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Size limit passed to the encoder in tests
pub const IMAGE_LIMIT: usize = 64 * 1024;

/// A small but fully decodable label photo
pub fn label_jpeg() -> Vec<u8> {
    let photo = image::RgbImage::from_pixel(32, 16, image::Rgb([248, 248, 240]));
    let mut bytes = Vec::new();
    photo
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .unwrap();
    bytes
}

pub const OWNER: &str = "7d44b88c-4199-4bad-97dc-d78268e01398";

pub fn owner() -> OwnerId {
    OwnerId::new(OWNER).unwrap()
}

/// In-memory store that can be told to reject writes
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<MedicationRecord>>,
    reject_writes: bool,
}

impl InMemoryStore {
    pub fn rejecting() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            reject_writes: true,
        }
    }

    pub fn records(&self) -> Vec<MedicationRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl MedicationStore for InMemoryStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_medication(
        &self,
        record: &MedicationRecord,
        dry_run: bool,
    ) -> Result<MedicationId> {
        if self.reject_writes {
            return Err(MedscanError::Persistence(
                "connection reset by peer".to_string(),
            ));
        }
        if !dry_run {
            self.records.lock().unwrap().push(record.clone());
        }
        Ok(record.id())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// Extraction settings pointing at a mock server
pub fn extraction_config(server: &mockito::ServerGuard) -> ExtractionConfig {
    ExtractionConfig {
        base_url: format!("{}/v1", server.url()),
        api_key: Some(secret_string("sk-integration".to_string())),
        timeout_seconds: 5,
        ..Default::default()
    }
}

/// Service wired to a mock inference server and an in-memory store
pub fn service_for(
    server: &mockito::ServerGuard,
    store: Arc<InMemoryStore>,
) -> MedicationService {
    let provider = OpenAiVisionProvider::new(extraction_config(server)).unwrap();
    MedicationService::new(Arc::new(provider), Duration::from_secs(5)).with_store(store)
}

/// A chat completion envelope carrying `content`
pub fn completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-integration",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}
