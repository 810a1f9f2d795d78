//! Medication service
//!
//! The two inbound operations of the pipeline:
//!
//! - [`MedicationService::extract_from_image`]: encoded image to draft
//! - [`MedicationService::reconcile_and_save`]: draft to stored record id
//!
//! The service holds no per-interaction state, so one instance can serve any
//! number of concurrent interactions.

use crate::adapters::database::{create_medication_store, MedicationStore};
use crate::adapters::vision::{OpenAiVisionProvider, VisionProvider};
use crate::config::MedscanConfig;
use crate::core::acquisition::EncodedImage;
use crate::core::extraction::parse_extraction;
use crate::core::reconcile::reconcile;
use crate::domain::{
    ExtractionServiceError, MedicationDraft, MedicationId, MedscanError, OwnerId, Result,
};
use crate::{log_error_with_context, log_extraction_complete, log_extraction_start};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Orchestrates extraction and persistence
pub struct MedicationService {
    provider: Arc<dyn VisionProvider>,
    store: Option<Arc<dyn MedicationStore + Send + Sync>>,
    timeout: Duration,
    dry_run: bool,
}

impl MedicationService {
    /// Creates a service without storage; only extraction is available
    pub fn new(provider: Arc<dyn VisionProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            store: None,
            timeout,
            dry_run: false,
        }
    }

    /// Attaches the store used by [`reconcile_and_save`](Self::reconcile_and_save)
    pub fn with_store(mut self, store: Arc<dyn MedicationStore + Send + Sync>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validate and reconcile, but skip the write
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builds the production service from configuration
    ///
    /// The store is created only when `with_storage` is set, so extraction
    /// works without a database.
    ///
    /// # Errors
    ///
    /// Returns [`MedscanError::Configuration`] if the HTTP client cannot be
    /// built or storage is requested but not configured.
    pub async fn from_config(config: &MedscanConfig, with_storage: bool) -> Result<Self> {
        let provider = OpenAiVisionProvider::new(config.extraction.clone())?;
        let mut service = Self::new(
            Arc::new(provider),
            Duration::from_secs(config.extraction.timeout_seconds),
        )
        .with_dry_run(config.application.dry_run);

        if with_storage {
            service = service.with_store(create_medication_store(config).await?);
        }

        Ok(service)
    }

    /// Extracts a draft from a label image
    ///
    /// The call is bounded by the configured timeout. Failures are never
    /// retried here; each one maps to a distinct error so the caller can offer
    /// manual entry.
    ///
    /// # Errors
    ///
    /// - [`MedscanError::Configuration`] if no credential is configured
    /// - [`MedscanError::ExtractionService`] for transport failures and timeouts
    /// - [`MedscanError::MalformedResponse`] if the reply is not a flat JSON object
    /// - [`MedscanError::IncompleteExtraction`] if the reply has no name
    pub async fn extract_from_image(&self, image: &EncodedImage) -> Result<MedicationDraft> {
        log_extraction_start!(image, self.provider.model());
        let start = Instant::now();

        let raw = match tokio::time::timeout(self.timeout, self.provider.read_label(image)).await {
            Ok(result) => result,
            Err(_) => Err(ExtractionServiceError::Timeout(format!(
                "no response within {}s",
                self.timeout.as_secs()
            ))
            .into()),
        };

        let result = raw.and_then(|text| parse_extraction(&text));

        match result {
            Ok(draft) => {
                log_extraction_complete!(&draft, start.elapsed());
                Ok(draft)
            }
            Err(e) => {
                if matches!(e, MedscanError::Configuration(_)) {
                    log_error_with_context!(&e, "Label extraction is not configured");
                } else {
                    tracing::warn!(
                        error = %e,
                        image_fingerprint = %image.fingerprint(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        manual_entry = e.offers_manual_entry(),
                        "Label extraction failed"
                    );
                }
                Err(e)
            }
        }
    }

    /// Like [`extract_from_image`](Self::extract_from_image), abandoned when
    /// `cancel` becomes `true`
    ///
    /// The in-flight request is dropped on cancellation, so its result can
    /// never reach a later interaction.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionServiceError::Cancelled` when cancelled, otherwise
    /// the same errors as [`extract_from_image`](Self::extract_from_image).
    pub async fn extract_from_image_with_cancel(
        &self,
        image: &EncodedImage,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<MedicationDraft> {
        if *cancel.borrow() {
            return Err(ExtractionServiceError::Cancelled.into());
        }

        tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => {
                tracing::info!(
                    image_fingerprint = %image.fingerprint(),
                    "Label extraction cancelled"
                );
                Err(ExtractionServiceError::Cancelled.into())
            }
            result = self.extract_from_image(image) => result,
        }
    }

    /// Creates the medications table if it does not exist yet
    ///
    /// Does nothing without a store or in dry run, so a dry run never
    /// changes the database.
    ///
    /// # Errors
    ///
    /// Returns [`MedscanError::Persistence`] if the schema cannot be created.
    pub async fn prepare_storage(&self) -> Result<()> {
        let Some(store) = self.store.as_ref() else {
            return Ok(());
        };
        if self.dry_run {
            tracing::debug!("DRY RUN: Skipping schema check");
            return Ok(());
        }

        store.ensure_schema().await.inspect_err(|e| {
            log_error_with_context!(e, "Failed to prepare medication storage");
        })
    }

    /// Validates `draft`, derives the record and stores it for `owner_id`
    ///
    /// Each successful call stores a new record, even for identical drafts.
    ///
    /// # Errors
    ///
    /// - [`MedscanError::Validation`] before any write if name or dosage is missing
    /// - [`MedscanError::Configuration`] if no store is attached (outside dry run)
    /// - [`MedscanError::Persistence`] if the store rejects the write
    pub async fn reconcile_and_save(
        &self,
        draft: &MedicationDraft,
        owner_id: OwnerId,
    ) -> Result<MedicationId> {
        let record = reconcile(draft, owner_id, Utc::now())?;

        let Some(store) = self.store.as_ref() else {
            if self.dry_run {
                tracing::info!(
                    medication_id = %record.id(),
                    owner_id = %owner_id,
                    "DRY RUN: Would store medication"
                );
                return Ok(record.id());
            }
            return Err(MedscanError::Configuration(
                "No medication store configured".to_string(),
            ));
        };

        match store.insert_medication(&record, self.dry_run).await {
            Ok(id) => Ok(id),
            Err(e) => {
                log_error_with_context!(&e, "Failed to store medication");
                Err(match e {
                    MedscanError::Persistence(_) | MedscanError::Validation(_) => e,
                    other => MedscanError::Persistence(other.to_string()),
                })
            }
        }
    }
}

/// Resolves once the flag turns true; never resolves if the sender is gone
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
        if *cancel.borrow() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::acquisition::encode_image;
    use crate::domain::MedicationRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CannedProvider {
        reply: String,
        delay: Duration,
    }

    impl CannedProvider {
        fn replying(text: &str) -> Self {
            Self {
                reply: text.to_string(),
                delay: Duration::ZERO,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                reply: r#"{"name":"Aspirin","dosage":81}"#.to_string(),
                delay,
            }
        }
    }

    #[async_trait]
    impl VisionProvider for CannedProvider {
        async fn read_label(&self, _image: &EncodedImage) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            Ok(self.reply.clone())
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        records: Mutex<Vec<MedicationRecord>>,
        schema_checks: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl MedicationStore for RecordingStore {
        async fn test_connection(&self) -> Result<()> {
            Ok(())
        }

        async fn ensure_schema(&self) -> Result<()> {
            self.schema_checks.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MedscanError::Persistence("permission denied".to_string()));
            }
            Ok(())
        }

        async fn insert_medication(
            &self,
            record: &MedicationRecord,
            dry_run: bool,
        ) -> Result<MedicationId> {
            if self.fail {
                return Err(MedscanError::Persistence("disk full".to_string()));
            }
            if !dry_run {
                self.records.lock().unwrap().push(record.clone());
            }
            Ok(record.id())
        }

        fn backend_name(&self) -> &str {
            "recording"
        }
    }

    fn image() -> EncodedImage {
        let photo = image::RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
        let mut bytes = Vec::new();
        photo
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        encode_image(&bytes, 64 * 1024).unwrap()
    }

    fn owner() -> OwnerId {
        OwnerId::new("7d44b88c-4199-4bad-97dc-d78268e01398").unwrap()
    }

    fn service(provider: CannedProvider) -> MedicationService {
        MedicationService::new(Arc::new(provider), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_extract_parses_reply() {
        let service = service(CannedProvider::replying(
            r#"{"name":"Amoxicillin","dosage":500,"unit":"mg","instructions":"Take twice daily","initial_quantity":20,"quantity_unit":"capsules"}"#,
        ));

        let draft = service.extract_from_image(&image()).await.unwrap();
        assert_eq!(draft.name, "Amoxicillin");
        assert_eq!(draft.dosage_value, Some(500.0));
        assert_eq!(draft.quantity_unit.as_deref(), Some("capsules"));
    }

    #[tokio::test]
    async fn test_extract_prose_is_malformed() {
        let service = service(CannedProvider::replying("Sorry, I cannot read this label."));
        let err = service.extract_from_image(&image()).await.unwrap_err();
        assert!(matches!(err, MedscanError::MalformedResponse(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_times_out() {
        let service = MedicationService::new(
            Arc::new(CannedProvider::slow(Duration::from_secs(60))),
            Duration::from_secs(30),
        );

        let err = service.extract_from_image(&image()).await.unwrap_err();
        assert!(matches!(
            err,
            MedscanError::ExtractionService(ExtractionServiceError::Timeout(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_abandons_extraction() {
        let service = service(CannedProvider::slow(Duration::from_secs(3)));
        let (tx, rx) = watch::channel(false);

        let image = image();
        let extraction = service.extract_from_image_with_cancel(&image, rx);
        let trigger = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(true).unwrap();
        };

        let (result, _) = tokio::join!(extraction, trigger);
        assert!(matches!(
            result,
            Err(MedscanError::ExtractionService(ExtractionServiceError::Cancelled))
        ));
    }

    #[tokio::test]
    async fn test_already_cancelled_makes_no_call() {
        let service = service(CannedProvider::replying(r#"{"name":"Aspirin"}"#));
        let (_tx, rx) = watch::channel(true);

        let result = service.extract_from_image_with_cancel(&image(), rx).await;
        assert!(matches!(
            result,
            Err(MedscanError::ExtractionService(ExtractionServiceError::Cancelled))
        ));
    }

    #[tokio::test]
    async fn test_dropped_sender_does_not_cancel() {
        let service = service(CannedProvider::replying(r#"{"name":"Aspirin"}"#));
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let draft = service
            .extract_from_image_with_cancel(&image(), rx)
            .await
            .unwrap();
        assert_eq!(draft.name, "Aspirin");
    }

    #[tokio::test]
    async fn test_save_stores_one_record_per_call() {
        let store = Arc::new(RecordingStore::default());
        let service = service(CannedProvider::replying("{}")).with_store(store.clone());
        let draft = MedicationDraft::new("Ibuprofen").with_dosage(200.0, "mg");

        let first = service.reconcile_and_save(&draft, owner()).await.unwrap();
        let second = service.reconcile_and_save(&draft, owner()).await.unwrap();

        assert_ne!(first, second);
        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].same_fields_as(&records[1]));
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_store() {
        let store = Arc::new(RecordingStore::default());
        let service = service(CannedProvider::replying("{}")).with_store(store.clone());

        let err = service
            .reconcile_and_save(&MedicationDraft::new("Ibuprofen"), owner())
            .await
            .unwrap_err();

        assert!(matches!(err, MedscanError::Validation(_)));
        assert!(store.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_persistence_error() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let service = service(CannedProvider::replying("{}")).with_store(store);
        let draft = MedicationDraft::new("Ibuprofen").with_dosage(200.0, "mg");

        let err = service.reconcile_and_save(&draft, owner()).await.unwrap_err();
        assert!(matches!(err, MedscanError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_dry_run_without_store() {
        let service = service(CannedProvider::replying("{}")).with_dry_run(true);
        let draft = MedicationDraft::new("Ibuprofen").with_dosage(200.0, "mg");
        assert!(service.reconcile_and_save(&draft, owner()).await.is_ok());
    }

    #[tokio::test]
    async fn test_save_without_store_is_configuration_error() {
        let service = service(CannedProvider::replying("{}"));
        let draft = MedicationDraft::new("Ibuprofen").with_dosage(200.0, "mg");
        let err = service.reconcile_and_save(&draft, owner()).await.unwrap_err();
        assert!(matches!(err, MedscanError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_prepare_storage_creates_schema() {
        let store = Arc::new(RecordingStore::default());
        let service = service(CannedProvider::replying("{}")).with_store(store.clone());

        service.prepare_storage().await.unwrap();
        assert_eq!(store.schema_checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prepare_storage_skipped_in_dry_run() {
        let store = Arc::new(RecordingStore::default());
        let service = service(CannedProvider::replying("{}"))
            .with_store(store.clone())
            .with_dry_run(true);

        service.prepare_storage().await.unwrap();
        assert_eq!(store.schema_checks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prepare_storage_failure_is_persistence_error() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let service = service(CannedProvider::replying("{}")).with_store(store);

        let err = service.prepare_storage().await.unwrap_err();
        assert!(matches!(err, MedscanError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_prepare_storage_without_store_is_noop() {
        let service = service(CannedProvider::replying("{}"));
        assert!(service.prepare_storage().await.is_ok());
    }
}
