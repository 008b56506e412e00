#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use async_openai::{
    Client as OpenAIClient,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrlArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
};
use async_trait::async_trait;

use super::{
    GradingResult, GradingService, inline_payload, parse_model_output, prompt::grading_prompt,
    schema::openai_schema,
};
use crate::{
    criteria::GradingCriteria, error::GradingError, locale::Locale, upload::SelectedFile,
};

/// Endpoint used when none is configured.
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Model used when none is configured.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Grades papers through any OpenAI-compatible chat-completion endpoint that
/// accepts image parts and `json_schema` response formats.
#[derive(Clone)]
pub struct OpenAiGrader {
    /// Configured client.
    client:      OpenAIClient<OpenAIConfig>,
    /// Model identifier.
    model:       String,
    /// Optional sampling temperature.
    temperature: Option<f32>,
    /// Language the prompt is written in.
    locale:      Locale,
}

impl OpenAiGrader {
    /// Creates a grader for `model` at `api_base`.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = OpenAIClient::with_config(
            OpenAIConfig::new()
                .with_api_base(api_base.into())
                .with_api_key(api_key.into()),
        );
        Self {
            client,
            model: model.into(),
            temperature: None,
            locale: Locale::default(),
        }
    }

    /// Reuses an existing HTTP client for requests.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.client = self.client.with_http_client(http);
        self
    }

    /// Sets the language of the prompt.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl GradingService for OpenAiGrader {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn grade(
        &self,
        file: &SelectedFile,
        criteria: &GradingCriteria,
    ) -> Result<GradingResult, GradingError> {
        // Chat endpoints only take images as URLs, so the payload travels as a
        // data URL here.
        let image_url = format!("data:{};base64,{}", file.media_type(), inline_payload(file)?);

        let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
            ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(
                    ImageUrlArgs::default()
                        .url(image_url)
                        .detail(ImageDetail::High)
                        .build()?,
                )
                .build()?
                .into(),
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(grading_prompt(criteria, self.locale))
                .build()?
                .into(),
        ];

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(parts)
            .build()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(vec![message.into()])
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    name:        "grading_result".to_string(),
                    description: Some("Grade of a handwritten answer sheet".to_string()),
                    schema:      Some(openai_schema()),
                    strict:      Some(true),
                },
            });
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }

        let response = self.client.chat().create(args.build()?).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone());
        let grade = parse_model_output(content.as_deref())?;
        Ok(grade.with_max_score(criteria.max_score))
    }
}
