#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use typed_builder::TypedBuilder;

use super::{
    GradingResult, GradingService, inline_payload, parse_model_output, prompt::grading_prompt,
    schema::gemini_schema,
};
use crate::{
    criteria::GradingCriteria, error::GradingError, locale::Locale, upload::SelectedFile,
};

/// Public Gemini API host.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Model used when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Grades papers with Gemini's `generateContent` endpoint, sending the image
/// as inline data and enforcing the grading schema through `responseSchema`.
#[derive(Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct GeminiGrader {
    /// API key sent in the `x-goog-api-key` header.
    api_key:     String,
    /// Scheme and host, without the `/v1beta` path.
    #[builder(default = DEFAULT_GEMINI_API_BASE.to_string())]
    api_base:    String,
    /// Model identifier, e.g. `gemini-2.5-flash`.
    #[builder(default = DEFAULT_GEMINI_MODEL.to_string())]
    model:       String,
    /// Optional sampling temperature.
    #[builder(default)]
    temperature: Option<f32>,
    /// Language the prompt is written in.
    #[builder(default)]
    locale:      Locale,
    /// Shared HTTP client.
    #[builder(default)]
    http:        reqwest::Client,
}

/// Body of a `generateContent` call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    /// A single user turn.
    pub(crate) contents:          Vec<Content>,
    /// Structured-output settings.
    pub(crate) generation_config: GenerationConfig,
}

/// One conversation turn.
#[derive(Debug, Serialize)]
pub(crate) struct Content {
    /// Image and text parts.
    pub(crate) parts: Vec<Part>,
}

/// Either an inline blob or a text part.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    /// Inline image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) inline_data: Option<InlineData>,
    /// Prompt text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) text:        Option<String>,
}

/// Base64 blob with its media type.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    /// Declared media type.
    pub(crate) mime_type: String,
    /// Base64 payload without a data-URL header.
    pub(crate) data:      String,
}

/// Settings forcing a JSON reply that follows the grading schema.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    /// Always `application/json`.
    pub(crate) response_mime_type: &'static str,
    /// The six-field grading schema.
    pub(crate) response_schema:    Value,
    /// Optional sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature:        Option<f32>,
}

/// The parts of a `generateContent` reply this crate reads.
#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    /// Candidate replies; only the first is used.
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// One candidate reply.
#[derive(Debug, Deserialize)]
struct Candidate {
    /// May be missing when the candidate was blocked.
    content: Option<CandidateContent>,
}

/// Content of a candidate reply.
#[derive(Debug, Deserialize)]
struct CandidateContent {
    /// Reply parts.
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// One reply part; non-text parts have no `text`.
#[derive(Debug, Deserialize)]
struct ResponsePart {
    /// Text, if this is a text part.
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if there is any.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }
}

impl GeminiGrader {
    /// Full URL of the `generateContent` method for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    /// Builds the request body for one answer sheet.
    pub(crate) fn request_body(
        &self,
        file: &SelectedFile,
        criteria: &GradingCriteria,
    ) -> Result<GenerateContentRequest, GradingError> {
        let image = Part {
            inline_data: Some(InlineData {
                mime_type: file.media_type().to_string(),
                data:      inline_payload(file)?,
            }),
            text:        None,
        };
        let prompt = Part {
            inline_data: None,
            text:        Some(grading_prompt(criteria, self.locale)),
        };

        Ok(GenerateContentRequest {
            contents:          vec![Content {
                parts: vec![image, prompt],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema:    gemini_schema(),
                temperature:        self.temperature,
            },
        })
    }
}

#[async_trait]
impl GradingService for GeminiGrader {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn grade(
        &self,
        file: &SelectedFile,
        criteria: &GradingCriteria,
    ) -> Result<GradingResult, GradingError> {
        let body = self.request_body(file, criteria)?;

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GradingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateContentResponse = response.json().await?;
        let grade = parse_model_output(reply.text().as_deref())?;
        Ok(grade.with_max_score(criteria.max_score))
    }
}
