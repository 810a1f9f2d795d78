//! Add command implementation
//!
//! Drives one [`AddMedicationSession`] from the command line: an optional
//! label photo is extracted first, flags act as the user's edits, and the
//! reviewed draft is submitted for reconciliation and storage.

use super::{exit_code_for, report_failure, EXIT_CONFIGURATION, EXIT_INPUT, EXIT_OK};
use crate::config::load_config;
use crate::core::acquisition::load_image_file;
use crate::core::service::MedicationService;
use crate::core::session::{AddMedicationSession, SessionEvent, SessionState};
use crate::domain::{ExtractionServiceError, MedicationDraft, MedscanError, OwnerId};
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Owner of the new record (UUID)
    #[arg(long)]
    pub owner: OwnerId,

    /// Label photo to pre-fill the draft from
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Medication name
    #[arg(long)]
    pub name: Option<String>,

    /// Dosage strength, e.g. 500
    #[arg(long)]
    pub dosage: Option<f64>,

    /// Dosage unit, e.g. mg
    #[arg(long)]
    pub unit: Option<String>,

    /// Dosing instructions
    #[arg(long)]
    pub instructions: Option<String>,

    /// Amount dispensed
    #[arg(long)]
    pub quantity: Option<u32>,

    /// Unit of the dispensed amount, e.g. pills
    #[arg(long)]
    pub quantity_unit: Option<String>,

    /// Validate and reconcile without writing to the database
    #[arg(long)]
    pub dry_run: bool,
}

impl AddArgs {
    /// Execute the add command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(
            owner_id = %self.owner,
            with_image = self.image.is_some(),
            "Starting add command"
        );

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };

        if self.dry_run {
            tracing::info!("Dry run enabled from CLI");
            config.application.dry_run = true;
        }

        if config.application.dry_run {
            println!("🔍 DRY RUN: the record will not be written");
        }

        let with_storage = !config.application.dry_run || config.postgresql.is_some();
        let service = match MedicationService::from_config(&config, with_storage).await {
            Ok(service) => service,
            Err(e) => return Ok(report_failure("Medication service is not available", &e)),
        };

        if let Err(e) = service.prepare_storage().await {
            return Ok(report_failure("Medication storage is not ready", &e));
        }

        let mut session = AddMedicationSession::new();

        match &self.image {
            Some(path) => {
                session.apply(SessionEvent::StartCapture)?;
                match load_image_file(path, config.extraction.max_image_bytes).await {
                    Ok(image) => {
                        session.apply(SessionEvent::ImageCaptured)?;
                        let request = session.pending_request().ok_or_else(|| {
                            anyhow::anyhow!("Session has no pending extraction request")
                        })?;

                        println!("📷 Reading label {}", path.display());
                        let result = service
                            .extract_from_image_with_cancel(&image, shutdown_signal)
                            .await;

                        if let Err(e) = &result {
                            if matches!(
                                e,
                                MedscanError::ExtractionService(ExtractionServiceError::Cancelled)
                            ) {
                                session.apply(SessionEvent::CancelExtraction)?;
                                println!("⚠️  {}", e.user_message());
                                return Ok(exit_code_for(e));
                            }
                        }

                        session.apply(SessionEvent::from_extraction(request, result))?;
                    }
                    Err(e) => {
                        session.apply(SessionEvent::CancelCapture)?;
                        println!("⚠️  {}", e.user_message());
                    }
                }

                match session.state() {
                    SessionState::Reviewing => {
                        print_draft("📋 Extracted from label", session.draft())
                    }
                    _ => {
                        if let Some(message) = session.last_error() {
                            println!("⚠️  {message}");
                        }
                        println!("   Falling back to manual entry");
                        session.apply(SessionEvent::EnterManually)?;
                    }
                }
            }
            None => session.apply(SessionEvent::EnterManually)?,
        }

        if let Some(edited) = self.apply_overrides(session.draft().clone()) {
            session.apply(SessionEvent::Edit(edited))?;
        }

        session.apply(SessionEvent::Submit)?;
        let outcome = service
            .reconcile_and_save(session.draft(), self.owner)
            .await;
        let failure_code = outcome.as_ref().err().map(exit_code_for);
        session.apply(SessionEvent::from_save(outcome))?;

        match session.state() {
            SessionState::Saved { record_id } => {
                print_draft("✅ Medication saved", session.draft());
                println!("   Record ID: {record_id}");
                Ok(EXIT_OK)
            }
            SessionState::Editing { errors } if !errors.is_empty() => {
                println!("❌ The medication could not be saved");
                for error in errors.errors() {
                    println!("   --{}: {}", flag_for(error.field), error.message);
                }
                Ok(failure_code.unwrap_or(EXIT_INPUT))
            }
            _ => {
                println!("❌ The medication could not be saved");
                if let Some(message) = session.last_error() {
                    println!("   {message}");
                }
                Ok(failure_code.unwrap_or(super::EXIT_FATAL))
            }
        }
    }

    /// Draft with every supplied flag applied, or `None` when no flag was given
    fn apply_overrides(&self, mut draft: MedicationDraft) -> Option<MedicationDraft> {
        let mut changed = false;

        if let Some(name) = &self.name {
            draft.name = name.clone();
            changed = true;
        }
        if let Some(dosage) = self.dosage {
            draft.dosage_value = Some(dosage);
            changed = true;
        }
        if let Some(unit) = &self.unit {
            draft.dosage_unit = Some(unit.clone());
            changed = true;
        }
        if let Some(instructions) = &self.instructions {
            draft.instructions = Some(instructions.clone());
            changed = true;
        }
        if let Some(quantity) = self.quantity {
            draft.initial_quantity = Some(quantity);
            changed = true;
        }
        if let Some(unit) = &self.quantity_unit {
            draft.quantity_unit = Some(unit.clone());
            changed = true;
        }

        changed.then_some(draft)
    }
}

fn flag_for(field: &str) -> &str {
    match field {
        "dosage_value" => "dosage",
        "dosage_unit" => "unit",
        "initial_quantity" => "quantity",
        "quantity_unit" => "quantity-unit",
        other => other,
    }
}

fn print_draft(headline: &str, draft: &MedicationDraft) {
    println!("{headline}");
    println!("   Name: {}", draft.name);
    if let Some(dosage) = draft.dosage_value {
        println!(
            "   Dosage: {} {}",
            dosage,
            draft.dosage_unit.as_deref().unwrap_or("")
        );
    }
    if let Some(instructions) = &draft.instructions {
        println!("   Instructions: {instructions}");
    }
    if let Some(quantity) = draft.initial_quantity {
        println!(
            "   Quantity: {} {}",
            quantity,
            draft.quantity_unit.as_deref().unwrap_or("")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args() -> AddArgs {
        AddArgs {
            owner: OwnerId::new("7d44b88c-4199-4bad-97dc-d78268e01398").unwrap(),
            image: None,
            name: None,
            dosage: None,
            unit: None,
            instructions: None,
            quantity: None,
            quantity_unit: None,
            dry_run: true,
        }
    }

    fn config_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[logging]\nlocal_enabled = false\n").unwrap();
        file
    }

    #[test]
    fn test_no_flags_means_no_edit() {
        let draft = MedicationDraft::new("Amoxicillin");
        assert!(args().apply_overrides(draft).is_none());
    }

    #[test]
    fn test_flags_override_extracted_fields() {
        let draft = MedicationDraft::new("Amoxicilin")
            .with_dosage(500.0, "mg")
            .with_instructions("Take 1 capsule 3 times daily");
        let mut args = args();
        args.name = Some("Amoxicillin".to_string());
        args.quantity = Some(21);

        let edited = args.apply_overrides(draft).unwrap();
        assert_eq!(edited.name, "Amoxicillin");
        assert_eq!(edited.dosage_value, Some(500.0));
        assert_eq!(edited.initial_quantity, Some(21));
        assert_eq!(
            edited.instructions.as_deref(),
            Some("Take 1 capsule 3 times daily")
        );
    }

    #[test]
    fn test_flag_names_for_fields() {
        assert_eq!(flag_for("name"), "name");
        assert_eq!(flag_for("dosage_value"), "dosage");
    }

    #[tokio::test]
    async fn test_manual_dry_run_succeeds_without_database() {
        let config = config_file();
        let mut args = args();
        args.name = Some("Ibuprofen".to_string());
        args.dosage = Some(200.0);
        let (_tx, rx) = watch::channel(false);

        let code = args
            .execute(config.path().to_str().unwrap(), rx)
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_manual_entry_without_dosage_is_input_exit() {
        let config = config_file();
        let mut args = args();
        args.name = Some("Ibuprofen".to_string());
        let (_tx, rx) = watch::channel(false);

        let code = args
            .execute(config.path().to_str().unwrap(), rx)
            .await
            .unwrap();
        assert_eq!(code, 3);
    }

    #[tokio::test]
    async fn test_unreadable_image_falls_back_to_flags() {
        let config = config_file();
        let mut args = args();
        args.image = Some(PathBuf::from("/nonexistent/label.jpg"));
        args.name = Some("Ibuprofen".to_string());
        args.dosage = Some(200.0);
        let (_tx, rx) = watch::channel(false);

        let code = args
            .execute(config.path().to_str().unwrap(), rx)
            .await
            .unwrap();
        assert_eq!(code, 0);
    }
}
