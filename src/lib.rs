//! # inkgrade
//!
//! Grades photographed handwritten answer sheets against an instructor's
//! reference answer. Transcription, comparison and scoring are delegated to a
//! multimodal model; this crate builds the request, validates the structured
//! reply, drives the loading-state machine and renders the result.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Pluggable grading backends and the request/response contract
pub mod client;
/// Environment-driven configuration
pub mod config;
/// The application controller and its loading-state machine
pub mod controller;
/// The grading configuration edited by the user
pub mod criteria;
/// Rendering of grading results
pub mod display;
/// Error types surfaced by the library
pub mod error;
/// User-visible strings in every supported language
pub mod locale;
/// Image selection, validation and previews
pub mod upload;

pub use client::{GradingResult, GradingService, grade_student_paper};
pub use controller::{Affordances, Attempt, Completion, Controller, LoadingState};
pub use criteria::{CriteriaField, GradingCriteria};
pub use error::{ControllerError, GradingError, SelectionError, StateError, ValidationError};
pub use locale::Locale;
pub use upload::{FileSelector, SelectedFile, SelectionEvent, SelectionOutcome};
