#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use thiserror::Error;

/// Failures raised while grading a paper through an external service.
///
/// The controller never inspects the variant; it logs the error and shows a
/// single generic message. The variants exist for diagnostics and tests.
#[derive(Debug, Error)]
pub enum GradingError {
    /// The selected file could not be turned into an inline payload.
    #[error("could not encode the answer sheet: {0}")]
    Encoding(String),
    /// The HTTP request never produced a response.
    #[error("request to the grading service failed")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("grading service returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body, kept for the logs.
        body:   String,
    },
    /// The OpenAI-compatible client reported a failure.
    #[error("OpenAI-compatible request failed")]
    OpenAi(#[from] async_openai::error::OpenAIError),
    /// The structured output did not match the grading schema.
    #[error("model output does not match the grading schema")]
    Schema(#[from] serde_json::Error),
    /// The model produced no text at all.
    #[error("no valid response was received from the model")]
    EmptyResponse,
    /// The attempt was aborted before it finished.
    #[error("grading attempt was cancelled")]
    Cancelled,
    /// The task running the attempt panicked.
    #[error("grading task failed: {0}")]
    TaskFailed(String),
}

/// Local precondition failures checked before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No answer sheet has been selected.
    #[error("no answer sheet selected")]
    MissingFile,
    /// The reference answer is empty or whitespace.
    #[error("reference answer is blank")]
    BlankReferenceAnswer,
}

/// Failures while accepting a file into the selector.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// The declared media type is not an image.
    #[error("unsupported media type `{0}`, only images are accepted")]
    UnsupportedMediaType(String),
    /// The file could not be read from disk.
    #[error("could not read {path}")]
    Io {
        /// Path that failed to load.
        path:   String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A `data:` URL was malformed.
    #[error("malformed data URL: {0}")]
    InvalidDataUrl(String),
}

/// An action was requested that the current loading state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{action}` is not available while {state}")]
pub struct StateError {
    /// The refused action.
    pub action: &'static str,
    /// Name of the state that refused it.
    pub state:  &'static str,
}

/// Why the controller refused a user action.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A grading precondition is not met.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The action is not available in the current state.
    #[error(transparent)]
    State(#[from] StateError),
    /// The file selector rejected the file.
    #[error(transparent)]
    Selection(#[from] SelectionError),
}
