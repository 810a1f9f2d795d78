//! Add-medication interaction state machine
//!
//! ```text
//! Idle -> Capturing -> Extracting -> Reviewing <-> Editing -> Validating -> Saved
//!              |            |                        ^            |
//!              v            v (failure, cancel)      +------------+ (field errors)
//!             Idle         Idle
//! ```
//!
//! A session owns exactly one draft. [`transition`] is pure: it never performs
//! I/O and returns the next session or an [`InvalidTransition`].
//!
//! Every image sent for extraction gets a new [`RequestId`]. Results that
//! arrive for any other id are dropped, so a cancelled or superseded call
//! cannot overwrite the draft of a later attempt.

use crate::domain::{MedicationDraft, MedicationId, MedscanError, Result, ValidationErrors};
use std::fmt;
use thiserror::Error;

/// Identifies one extraction attempt within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the interaction currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Capturing,
    Extracting { request: RequestId },
    Reviewing,
    Editing { errors: ValidationErrors },
    Validating,
    Saved { record_id: MedicationId },
}

impl SessionState {
    /// Short state name for logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Capturing => "capturing",
            SessionState::Extracting { .. } => "extracting",
            SessionState::Reviewing => "reviewing",
            SessionState::Editing { .. } => "editing",
            SessionState::Validating => "validating",
            SessionState::Saved { .. } => "saved",
        }
    }
}

/// Inputs that move the session forward
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// User opened the camera or file picker
    StartCapture,
    /// User closed the picker without choosing an image
    CancelCapture,
    /// An image was chosen and is being sent for extraction
    ImageCaptured,
    /// Extraction for `request` produced a draft
    ExtractionSucceeded {
        request: RequestId,
        draft: MedicationDraft,
    },
    /// Extraction for `request` failed
    ExtractionFailed { request: RequestId, message: String },
    /// User abandoned the in-flight extraction
    CancelExtraction,
    /// User skipped scanning and fills the form by hand
    EnterManually,
    /// User changed the draft
    Edit(MedicationDraft),
    /// User asked to save the draft
    Submit,
    /// The draft failed the mandatory-field check
    ValidationFailed(ValidationErrors),
    /// The storage write failed
    SaveFailed(String),
    /// The record was stored under `record_id`
    Saved(MedicationId),
}

impl SessionEvent {
    /// Maps an extraction outcome onto the matching event
    pub fn from_extraction(request: RequestId, result: Result<MedicationDraft>) -> Self {
        match result {
            Ok(draft) => SessionEvent::ExtractionSucceeded { request, draft },
            Err(e) => SessionEvent::ExtractionFailed {
                request,
                message: e.user_message(),
            },
        }
    }

    /// Maps a save outcome onto the matching event
    pub fn from_save(result: Result<MedicationId>) -> Self {
        match result {
            Ok(id) => SessionEvent::Saved(id),
            Err(MedscanError::Validation(errors)) => SessionEvent::ValidationFailed(errors),
            Err(e) => SessionEvent::SaveFailed(e.user_message()),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SessionEvent::StartCapture => "start_capture",
            SessionEvent::CancelCapture => "cancel_capture",
            SessionEvent::ImageCaptured => "image_captured",
            SessionEvent::ExtractionSucceeded { .. } => "extraction_succeeded",
            SessionEvent::ExtractionFailed { .. } => "extraction_failed",
            SessionEvent::CancelExtraction => "cancel_extraction",
            SessionEvent::EnterManually => "enter_manually",
            SessionEvent::Edit(_) => "edit",
            SessionEvent::Submit => "submit",
            SessionEvent::ValidationFailed(_) => "validation_failed",
            SessionEvent::SaveFailed(_) => "save_failed",
            SessionEvent::Saved(_) => "saved",
        }
    }
}

/// An event that has no meaning in the current state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Event '{event}' is not allowed in state '{state}'")]
pub struct InvalidTransition {
    pub state: &'static str,
    pub event: &'static str,
}

/// One add-medication interaction
#[derive(Debug, Clone, PartialEq)]
pub struct AddMedicationSession {
    state: SessionState,
    draft: MedicationDraft,
    last_error: Option<String>,
    next_request: u64,
}

impl Default for AddMedicationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AddMedicationSession {
    /// Starts a new interaction in [`SessionState::Idle`]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            draft: MedicationDraft::default(),
            last_error: None,
            next_request: 1,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The draft owned by this interaction
    pub fn draft(&self) -> &MedicationDraft {
        &self.draft
    }

    /// Message for the most recent failure, cleared by the next capture
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Id of the extraction currently awaited, if any
    pub fn pending_request(&self) -> Option<RequestId> {
        match self.state {
            SessionState::Extracting { request } => Some(request),
            _ => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self.state, SessionState::Saved { .. })
    }

    /// Applies `event` in place
    ///
    /// On error the session is left untouched.
    pub fn apply(&mut self, event: SessionEvent) -> std::result::Result<(), InvalidTransition> {
        *self = transition(self, event)?;
        Ok(())
    }

    fn moved_to(&self, state: SessionState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}

/// Computes the session that follows `event`
///
/// Extraction results for a request other than the pending one are ignored
/// and return the session unchanged.
///
/// # Examples
///
/// ```
/// use medscan::core::session::{transition, AddMedicationSession, SessionEvent, SessionState};
/// use medscan::domain::MedicationDraft;
///
/// let session = AddMedicationSession::new();
/// let session = transition(&session, SessionEvent::StartCapture).unwrap();
/// let session = transition(&session, SessionEvent::ImageCaptured).unwrap();
/// let request = session.pending_request().unwrap();
///
/// let draft = MedicationDraft::new("Amoxicillin").with_dosage(500.0, "mg");
/// let session = transition(
///     &session,
///     SessionEvent::ExtractionSucceeded { request, draft },
/// )
/// .unwrap();
///
/// assert_eq!(session.state(), &SessionState::Reviewing);
/// assert_eq!(session.draft().name, "Amoxicillin");
/// ```
pub fn transition(
    session: &AddMedicationSession,
    event: SessionEvent,
) -> std::result::Result<AddMedicationSession, InvalidTransition> {
    use SessionEvent as E;
    use SessionState as S;

    let next = match (&session.state, event) {
        (S::Idle, E::StartCapture) => AddMedicationSession {
            state: S::Capturing,
            draft: MedicationDraft::default(),
            last_error: None,
            next_request: session.next_request,
        },

        (S::Idle, E::EnterManually) => AddMedicationSession {
            state: S::Editing {
                errors: ValidationErrors::new(),
            },
            draft: MedicationDraft::manual(),
            last_error: None,
            next_request: session.next_request,
        },

        (S::Capturing, E::CancelCapture) => session.moved_to(S::Idle),

        (S::Capturing, E::ImageCaptured) => AddMedicationSession {
            state: S::Extracting {
                request: RequestId(session.next_request),
            },
            next_request: session.next_request + 1,
            ..session.clone()
        },

        (S::Extracting { request: pending }, E::ExtractionSucceeded { request, draft })
            if *pending == request =>
        {
            AddMedicationSession {
                state: S::Reviewing,
                draft,
                last_error: None,
                next_request: session.next_request,
            }
        }

        (S::Extracting { request: pending }, E::ExtractionFailed { request, message })
            if *pending == request =>
        {
            AddMedicationSession {
                state: S::Idle,
                last_error: Some(message),
                ..session.clone()
            }
        }

        // Late or superseded results never touch the current draft
        (_, E::ExtractionSucceeded { .. }) | (_, E::ExtractionFailed { .. }) => session.clone(),

        (S::Extracting { .. }, E::CancelExtraction) => AddMedicationSession {
            state: S::Idle,
            last_error: Some("Label scanning was cancelled.".to_string()),
            ..session.clone()
        },

        (S::Reviewing | S::Editing { .. }, E::Edit(draft)) => AddMedicationSession {
            state: S::Editing {
                errors: ValidationErrors::new(),
            },
            draft,
            ..session.clone()
        },

        (S::Reviewing | S::Editing { .. }, E::Submit) => AddMedicationSession {
            state: S::Validating,
            last_error: None,
            ..session.clone()
        },

        (S::Validating, E::ValidationFailed(errors)) => AddMedicationSession {
            last_error: Some(errors.to_string()),
            state: S::Editing { errors },
            ..session.clone()
        },

        (S::Validating, E::SaveFailed(message)) => AddMedicationSession {
            state: S::Editing {
                errors: ValidationErrors::new(),
            },
            last_error: Some(message),
            ..session.clone()
        },

        (S::Validating, E::Saved(record_id)) => session.moved_to(S::Saved { record_id }),

        (state, event) => {
            return Err(InvalidTransition {
                state: state.name(),
                event: event.name(),
            })
        }
    };

    Ok(next)
}
