#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The application controller.
//!
//! A [`Controller`] owns the criteria, the file selector and the loading
//! state. Every transition goes through `&mut self`, and each grading call
//! runs as a spawned task tagged with an attempt id. The controller owns the
//! task handle: a reset aborts the task, dropping the controller aborts it,
//! and a completion whose id is no longer current is discarded.

use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    client::{GradingResult, GradingService, grade_student_paper},
    criteria::{CriteriaField, GradingCriteria},
    error::{ControllerError, GradingError, StateError, ValidationError},
    locale::Locale,
    upload::{FileSelector, SelectionEvent, SelectionOutcome},
};

/// Where the grading flow currently is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadingState {
    /// Waiting for input.
    #[default]
    Idle,
    /// A grading call is in flight.
    Processing {
        /// Id of the current attempt.
        attempt: Uuid,
    },
    /// The last attempt produced a result.
    Success(GradingResult),
    /// The last attempt failed; holds the user-facing message.
    Error(String),
}

impl LoadingState {
    /// Lower-case state name, used in refusals and logs.
    pub fn name(&self) -> &'static str {
        match self {
            LoadingState::Idle => "idle",
            LoadingState::Processing { .. } => "processing",
            LoadingState::Success(_) => "success",
            LoadingState::Error(_) => "error",
        }
    }
}

/// Which parts of the page are usable in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    /// The criteria form accepts edits.
    pub form_enabled:     bool,
    /// The file drop zone is shown.
    pub selector_visible: bool,
    /// The file drop zone accepts files.
    pub selector_enabled: bool,
    /// The grade action is offered.
    pub can_grade:        bool,
    /// The reset action is offered.
    pub can_reset:        bool,
    /// The result card is shown.
    pub result_visible:   bool,
}

/// A grading call started by [`Controller::begin_grading`]. The task itself
/// stays with the controller; this is only its ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// Attempt id.
    id: Uuid,
}

impl Attempt {
    /// Attempt id.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// The spawned call of the current attempt.
#[derive(Debug)]
struct InFlight {
    /// Attempt id.
    id:     Uuid,
    /// The spawned call.
    handle: JoinHandle<Result<GradingResult, GradingError>>,
}

/// How a finished attempt affected the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result was stored and the state is `Success`.
    Succeeded,
    /// The call failed and the state is `Error`.
    Failed,
    /// The attempt was no longer current; nothing changed.
    Discarded,
}

/// Drives the grading flow for one page.
pub struct Controller {
    /// The grading backend.
    service:   Arc<dyn GradingService>,
    /// Current grading configuration.
    criteria:  GradingCriteria,
    /// The answer-sheet selector.
    selector:  FileSelector,
    /// Current loading state.
    state:     LoadingState,
    /// Validation message shown while idle.
    notice:    Option<String>,
    /// Language of user-facing messages.
    locale:    Locale,
    /// The in-flight attempt, aborted on reset or drop.
    in_flight: Option<InFlight>,
}

impl Controller {
    /// Creates an idle controller with default criteria and no file.
    pub fn new(service: Arc<dyn GradingService>, locale: Locale) -> Self {
        Self {
            service,
            criteria: GradingCriteria::default(),
            selector: FileSelector::new(locale),
            state: LoadingState::Idle,
            notice: None,
            locale,
            in_flight: None,
        }
    }

    /// Replaces the whole criteria, e.g. when loaded from the command line.
    pub fn with_criteria(mut self, criteria: GradingCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Current loading state.
    pub fn state(&self) -> &LoadingState {
        &self.state
    }

    /// Current criteria.
    pub fn criteria(&self) -> &GradingCriteria {
        &self.criteria
    }

    /// The file selector.
    pub fn selector(&self) -> &FileSelector {
        &self.selector
    }

    /// Language of user-facing messages.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// The stored result, only while in `Success`.
    pub fn result(&self) -> Option<&GradingResult> {
        match &self.state {
            LoadingState::Success(result) => Some(result),
            _ => None,
        }
    }

    /// The message to show: the failure message in `Error`, otherwise any
    /// validation message.
    pub fn message(&self) -> Option<&str> {
        match &self.state {
            LoadingState::Error(message) => Some(message),
            _ => self.notice.as_deref(),
        }
    }

    /// What the page offers in the current state.
    pub fn affordances(&self) -> Affordances {
        let editable = matches!(self.state, LoadingState::Idle | LoadingState::Error(_));
        Affordances {
            form_enabled:     editable,
            selector_visible: !matches!(self.state, LoadingState::Success(_)),
            selector_enabled: editable,
            can_grade:        editable,
            can_reset:        matches!(
                self.state,
                LoadingState::Success(_) | LoadingState::Error(_)
            ),
            result_visible:   matches!(self.state, LoadingState::Success(_)),
        }
    }

    /// Builds the refusal for `action` in the current state.
    fn refuse(&self, action: &'static str) -> StateError {
        StateError {
            action,
            state: self.state.name(),
        }
    }

    /// Replaces one criteria field. Refused while processing or showing a
    /// result.
    pub fn update_criteria(&mut self, field: CriteriaField) -> Result<(), StateError> {
        if !self.affordances().form_enabled {
            return Err(self.refuse("edit criteria"));
        }
        self.criteria.set(field);
        Ok(())
    }

    /// Forwards a picker or drop-zone event to the selector.
    pub fn select_file(
        &mut self,
        event: SelectionEvent,
    ) -> Result<SelectionOutcome, ControllerError> {
        if !self.affordances().selector_visible {
            return Err(self.refuse("select file").into());
        }
        Ok(self.selector.select(event)?)
    }

    /// Decodes the preview of the selected file, if any.
    pub async fn load_preview(&mut self) -> Option<&str> {
        self.selector.load_preview().await
    }

    /// Records a validation failure as the idle notice.
    fn invalid(&mut self, err: ValidationError) -> ControllerError {
        let message = self.locale.validation(err);
        tracing::warn!("{message}");
        self.notice = Some(message.to_string());
        err.into()
    }

    /// Validates the inputs and starts a grading attempt.
    ///
    /// From `Error` the failure is cleared first. When a precondition fails
    /// the state stays `Idle` with a validation message and the service is not
    /// called. Must be called inside a Tokio runtime.
    pub fn begin_grading(&mut self) -> Result<Attempt, ControllerError> {
        match self.state {
            LoadingState::Idle => {}
            LoadingState::Error(_) => self.state = LoadingState::Idle,
            LoadingState::Processing { .. } | LoadingState::Success(_) => {
                return Err(self.refuse("grade").into());
            }
        }

        let Some(file) = self.selector.selected().cloned() else {
            return Err(self.invalid(ValidationError::MissingFile));
        };
        if !self.criteria.has_reference_answer() {
            return Err(self.invalid(ValidationError::BlankReferenceAnswer));
        }

        let id = Uuid::new_v4();
        tracing::info!(attempt = %id, "Grading {} with {}", file.name(), self.service.name());

        self.notice = None;
        self.state = LoadingState::Processing { attempt: id };
        self.selector.set_disabled(true);

        let service = Arc::clone(&self.service);
        let criteria = self.criteria.clone();
        let handle = tokio::spawn(async move {
            grade_student_paper(service.as_ref(), &file, &criteria).await
        });
        self.in_flight = Some(InFlight { id, handle });

        Ok(Attempt { id })
    }

    /// Waits for `attempt` and applies its outcome. An attempt that is no
    /// longer in flight is discarded without waiting.
    ///
    /// If this future is dropped early the task keeps running under the
    /// controller, so a later `finish` or `reset` still settles it.
    pub async fn finish(&mut self, attempt: Attempt) -> Completion {
        let handle = match self.in_flight.as_mut() {
            Some(in_flight) if in_flight.id == attempt.id => &mut in_flight.handle,
            _ => {
                tracing::warn!(attempt = %attempt.id, "Attempt is no longer in flight");
                return Completion::Discarded;
            }
        };
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => Err(GradingError::Cancelled),
            Err(e) => Err(GradingError::TaskFailed(e.to_string())),
        };
        self.apply(attempt.id, outcome)
    }

    /// Applies the outcome of attempt `id`. Outcomes of attempts that are no
    /// longer current are discarded.
    pub fn apply(
        &mut self,
        id: Uuid,
        outcome: Result<GradingResult, GradingError>,
    ) -> Completion {
        if self.state != (LoadingState::Processing { attempt: id }) {
            tracing::warn!(attempt = %id, "Discarding stale grading response");
            return Completion::Discarded;
        }

        self.in_flight = None;
        self.selector.set_disabled(false);

        match outcome {
            Ok(result) => {
                tracing::info!(attempt = %id, "Graded: {} / {}", result.score, result.max_score);
                self.state = LoadingState::Success(result);
                Completion::Succeeded
            }
            Err(err) => {
                tracing::error!(attempt = %id, "Error grading paper: {err:?}");
                self.state = LoadingState::Error(self.locale.grading_failed().to_string());
                Completion::Failed
            }
        }
    }

    /// Starts an attempt and waits for it.
    ///
    /// Dropping the returned future, e.g. under a timeout, aborts the
    /// attempt and returns the controller to `Idle` with its inputs kept.
    pub async fn grade(&mut self) -> Result<Completion, ControllerError> {
        let attempt = self.begin_grading()?;
        let mut pending = Pending {
            controller: self,
            attempt,
            settled: false,
        };
        let completion = pending.controller.finish(attempt).await;
        pending.settled = true;
        Ok(completion)
    }

    /// Aborts `attempt` if it is still in flight and goes back to `Idle`.
    fn abandon(&mut self, attempt: Attempt) {
        if self.state != (LoadingState::Processing { attempt: attempt.id }) {
            return;
        }
        tracing::warn!(attempt = %attempt.id, "Grading abandoned before it finished");
        self.abort_in_flight();
        self.state = LoadingState::Idle;
        self.selector.set_disabled(false);
    }

    /// Aborts the in-flight task, if any.
    fn abort_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }

    /// Leaves `Error` for `Idle`, keeping the inputs.
    pub fn dismiss_error(&mut self) -> Result<(), StateError> {
        if !matches!(self.state, LoadingState::Error(_)) {
            return Err(self.refuse("dismiss error"));
        }
        self.state = LoadingState::Idle;
        Ok(())
    }

    /// Returns to `Idle`, clearing the result, the selected file and any
    /// message, and aborting an in-flight attempt.
    pub fn reset(&mut self) {
        if self.in_flight.is_some() {
            tracing::info!("Cancelling in-flight grading attempt");
            self.abort_in_flight();
        }
        self.state = LoadingState::Idle;
        self.notice = None;
        self.selector.clear();
        self.selector.set_disabled(false);
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

/// Settles an attempt started by [`Controller::grade`] if that future is
/// dropped before the outcome is applied.
struct Pending<'a> {
    /// The controller running the attempt.
    controller: &'a mut Controller,
    /// The attempt being awaited.
    attempt:    Attempt,
    /// Set once the outcome has been applied.
    settled:    bool,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.controller.abandon(self.attempt);
        }
    }
}
