//! End-to-end tests for label photo to stored record
//!
//! The inference service is a mockito server; storage is in memory.

mod common;

use common::{completion, label_jpeg, owner, service_for, InMemoryStore, IMAGE_LIMIT};
use medscan::core::acquisition::{encode_image, load_image_file, EncodedImage};
use medscan::domain::{ExtractionServiceError, MedscanError};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

fn label() -> EncodedImage {
    encode_image(&label_jpeg(), IMAGE_LIMIT).unwrap()
}

#[tokio::test]
async fn test_amoxicillin_label_to_record() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-integration")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 500
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(
            r#"{"name": "Amoxicillin", "dosage": 500, "unit": "mg", "instructions": "Take 1 capsule 3 times daily", "initial_quantity": 21, "quantity_unit": "capsules"}"#,
        ))
        .create_async()
        .await;

    let store = Arc::new(InMemoryStore::default());
    let service = service_for(&server, store.clone());

    let draft = service.extract_from_image(&label()).await.unwrap();
    assert_eq!(draft.name, "Amoxicillin");
    assert_eq!(draft.dosage_value, Some(500.0));
    assert_eq!(draft.dosage_unit.as_deref(), Some("mg"));
    assert_eq!(draft.initial_quantity, Some(21));
    assert_eq!(draft.quantity_unit.as_deref(), Some("capsules"));

    let id = service.reconcile_and_save(&draft, owner()).await.unwrap();

    let records = store.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id(), id);
    assert_eq!(record.owner_id(), owner());
    assert_eq!(record.name(), "Amoxicillin");
    assert_eq!(record.dosage_value(), 500.0);
    assert_eq!(record.instructions(), Some("Take 1 capsule 3 times daily"));
    assert_eq!(record.initial_quantity(), Some(21));
    assert_eq!(record.remaining_quantity(), Some(21));
    assert_eq!(record.quantity_unit(), "capsules");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_image_file_is_sent_as_data_uri() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex(r#""url":"data:image/jpeg;base64,"#.to_string()))
        .with_status(200)
        .with_body(completion(r#"{"name": "Metformin", "dosage": "850", "unit": "mg"}"#))
        .create_async()
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("label.jpg");
    std::fs::write(&path, label_jpeg()).unwrap();

    let image = load_image_file(&path, IMAGE_LIMIT).await.unwrap();
    let service = service_for(&server, Arc::new(InMemoryStore::default()));
    let draft = service.extract_from_image(&image).await.unwrap();

    assert_eq!(draft.name, "Metformin");
    assert_eq!(draft.dosage_value, Some(850.0));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_prose_reply_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion("I'm sorry, the label is too blurry to read."))
        .create_async()
        .await;

    let service = service_for(&server, Arc::new(InMemoryStore::default()));
    let err = service.extract_from_image(&label()).await.unwrap_err();

    assert!(matches!(err, MedscanError::MalformedResponse(_)));
    assert!(err.offers_manual_entry());
}

#[tokio::test]
async fn test_reply_without_name_is_incomplete() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion(r#"{"dosage": 10, "unit": "mg"}"#))
        .create_async()
        .await;

    let service = service_for(&server, Arc::new(InMemoryStore::default()));
    let err = service.extract_from_image(&label()).await.unwrap_err();

    assert!(matches!(err, MedscanError::IncompleteExtraction(_)));
    assert_eq!(
        err.user_message(),
        "Could not extract medication name from image. Please enter details manually."
    );
}

#[tokio::test]
async fn test_service_outage_offers_manual_entry() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .with_body(r#"{"error": {"message": "overloaded"}}"#)
        .create_async()
        .await;

    let service = service_for(&server, Arc::new(InMemoryStore::default()));
    let err = service.extract_from_image(&label()).await.unwrap_err();

    assert!(matches!(
        err,
        MedscanError::ExtractionService(ExtractionServiceError::ServerError { status: 503, .. })
    ));
    assert!(err.offers_manual_entry());
}

#[tokio::test]
async fn test_draft_without_dosage_is_never_written() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion(r#"{"name": "Vitamin D3"}"#))
        .create_async()
        .await;

    let store = Arc::new(InMemoryStore::default());
    let service = service_for(&server, store.clone());

    let draft = service.extract_from_image(&label()).await.unwrap();
    let err = service.reconcile_and_save(&draft, owner()).await.unwrap_err();

    match err {
        MedscanError::Validation(errors) => {
            assert_eq!(errors.for_field("dosage_value"), Some("Dosage is required"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn test_rejected_write_is_persistence_error() {
    let server = mockito::Server::new_async().await;
    let service = service_for(&server, Arc::new(InMemoryStore::rejecting()));

    let draft = medscan::domain::MedicationDraft::new("Aspirin").with_dosage(81.0, "mg");
    let err = service.reconcile_and_save(&draft, owner()).await.unwrap_err();

    assert!(matches!(err, MedscanError::Persistence(_)));
    assert_eq!(err.user_message(), "Failed to save medication.");
}

#[tokio::test]
async fn test_cancelled_extraction_reports_cancelled() {
    let server = mockito::Server::new_async().await;
    let service = service_for(&server, Arc::new(InMemoryStore::default()));

    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let err = service
        .extract_from_image_with_cancel(&label(), rx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MedscanError::ExtractionService(ExtractionServiceError::Cancelled)
    ));
}

#[tokio::test]
async fn test_identical_drafts_create_separate_records() {
    let server = mockito::Server::new_async().await;
    let store = Arc::new(InMemoryStore::default());
    let service = service_for(&server, store.clone());

    let draft = medscan::domain::MedicationDraft::new("Ibuprofen").with_dosage(200.0, "mg");
    let first = service.reconcile_and_save(&draft, owner()).await.unwrap();
    let second = service.reconcile_and_save(&draft, owner()).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(store.records().len(), 2);
}
