#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The request/response contract with the external grading model.
//!
//! Every backend implements [`GradingService`]; the controller only ever talks
//! to that trait, so tests substitute a fake and the CLI picks a backend from
//! configuration.

/// Native Gemini `generateContent` backend
pub mod gemini;
/// OpenAI-compatible chat-completion backend
pub mod openai;
/// Instruction block sent alongside the image
pub mod prompt;
/// The enforced structured-output schema
pub mod schema;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use self::{gemini::GeminiGrader, openai::OpenAiGrader, prompt::grading_prompt};
use crate::{criteria::GradingCriteria, error::GradingError, upload::SelectedFile};

/// A graded answer sheet as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    /// Text the model read from the image.
    pub transcribed_text: String,
    /// Awarded score; not clamped to `max_score`.
    pub score:            f64,
    /// Copied from the criteria, never from the model.
    pub max_score:        f64,
    /// Summary of the evaluation.
    pub feedback:         String,
    /// What the answer got right, in order.
    pub strengths:        Vec<String>,
    /// What the answer is missing, in order.
    pub weaknesses:       Vec<String>,
    /// Why this score was given.
    pub reasoning:        String,
}

/// The six fields the model is required to return.
///
/// Unknown fields are ignored, so a `maxScore` invented by the model never
/// reaches the result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelGrade {
    /// Text the model read from the image.
    pub transcribed_text: String,
    /// Awarded score.
    pub score:            f64,
    /// Summary of the evaluation.
    pub feedback:         String,
    /// Strong points.
    pub strengths:        Vec<String>,
    /// Weak points.
    pub weaknesses:       Vec<String>,
    /// Justification of the score.
    pub reasoning:        String,
}

impl ModelGrade {
    /// Attaches the criteria's maximum score.
    pub fn with_max_score(self, max_score: f64) -> GradingResult {
        GradingResult {
            transcribed_text: self.transcribed_text,
            score: self.score,
            max_score,
            feedback: self.feedback,
            strengths: self.strengths,
            weaknesses: self.weaknesses,
            reasoning: self.reasoning,
        }
    }
}

/// Decodes the model's structured output.
///
/// Absent or blank output is [`GradingError::EmptyResponse`]; anything that
/// does not fit [`ModelGrade`] is [`GradingError::Schema`].
pub fn parse_model_output(text: Option<&str>) -> Result<ModelGrade, GradingError> {
    let text = text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(GradingError::EmptyResponse)?;
    Ok(serde_json::from_str(text)?)
}

/// Base64 payload for the inline image part.
pub fn inline_payload(file: &SelectedFile) -> Result<String, GradingError> {
    if file.bytes().is_empty() {
        return Err(GradingError::Encoding(format!("{} is empty", file.name())));
    }
    Ok(file.base64_payload())
}

/// A multimodal model able to grade one answer sheet.
#[async_trait]
pub trait GradingService: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Transcribes, compares and scores the sheet in a single call.
    async fn grade(
        &self,
        file: &SelectedFile,
        criteria: &GradingCriteria,
    ) -> Result<GradingResult, GradingError>;
}

/// Grades one paper through `service`, pinning the result's maximum score to
/// the criteria.
pub async fn grade_student_paper(
    service: &dyn GradingService,
    file: &SelectedFile,
    criteria: &GradingCriteria,
) -> Result<GradingResult, GradingError> {
    tracing::debug!("Grading {} with the {} backend", file.name(), service.name());
    let mut result = service.grade(file, criteria).await?;
    result.max_score = criteria.max_score;
    Ok(result)
}
