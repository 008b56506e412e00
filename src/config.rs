#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    str::FromStr,
    sync::{Arc, OnceLock},
    time::Duration,
};

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Client;

use crate::{
    client::{
        GeminiGrader, GradingService, OpenAiGrader,
        gemini::{DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL},
        openai::{DEFAULT_OPENAI_API_BASE, DEFAULT_OPENAI_MODEL},
    },
    locale::Locale,
};

/// Request timeout used when `INKGRADE_TIMEOUT_SECS` is unset.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Which grading backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Native Gemini `generateContent`.
    #[default]
    Gemini,
    /// OpenAI-compatible chat completions.
    OpenAi,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Backend::Gemini),
            "openai" | "open-ai" => Ok(Backend::OpenAi),
            other => Err(format!("unknown backend `{other}`, expected `gemini` or `openai`")),
        }
    }
}

/// Gemini credentials and tuning sourced from the environment.
#[derive(Clone)]
pub struct GeminiEnv {
    /// API key; `None` when neither variable is set.
    api_key:     Option<String>,
    /// Scheme and host of the API.
    api_base:    String,
    /// Model identifier.
    model:       String,
    /// Optional temperature override.
    temperature: Option<f32>,
}

/// OpenAI-compatible credentials and tuning sourced from the environment.
#[derive(Clone)]
pub struct OpenAiEnv {
    /// API key; `None` when unset.
    api_key:     Option<String>,
    /// Base URL of the OpenAI-compatible API.
    api_base:    String,
    /// Model identifier.
    model:       String,
    /// Optional temperature override.
    temperature: Option<f32>,
}

/// Runtime configuration shared across the binary.
pub struct Config {
    /// Selected backend.
    backend:     Backend,
    /// Gemini settings.
    gemini:      GeminiEnv,
    /// OpenAI-compatible settings.
    openai:      OpenAiEnv,
    /// Language of user-facing messages.
    locale:      Locale,
    /// Shared reqwest HTTP client reused by every backend.
    http_client: Client,
    /// Timeout applied to grading requests.
    timeout:     Duration,
}

/// Reads a trimmed, non-empty value.
fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Builds the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = match non_empty(&lookup, "INKGRADE_BACKEND") {
            Some(value) => value.parse::<Backend>().map_err(|e| anyhow!(e))?,
            None => Backend::default(),
        };
        let locale = match non_empty(&lookup, "INKGRADE_LOCALE") {
            Some(value) => value.parse::<Locale>().map_err(|e| anyhow!(e))?,
            None => Locale::default(),
        };
        let timeout = match non_empty(&lookup, "INKGRADE_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(
                value
                    .parse::<u64>()
                    .with_context(|| format!("INKGRADE_TIMEOUT_SECS is not a number: {value}"))?,
            ),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let gemini = GeminiEnv {
            api_key:     non_empty(&lookup, "GEMINI_API_KEY")
                .or_else(|| non_empty(&lookup, "API_KEY")),
            api_base:    non_empty(&lookup, "GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            model:       non_empty(&lookup, "GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            temperature: non_empty(&lookup, "GEMINI_TEMPERATURE").and_then(|s| s.parse().ok()),
        };

        let openai = OpenAiEnv {
            api_key:     non_empty(&lookup, "OPENAI_API_KEY"),
            api_base:    non_empty(&lookup, "OPENAI_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
            model:       non_empty(&lookup, "OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            temperature: non_empty(&lookup, "OPENAI_TEMPERATURE").and_then(|s| s.parse().ok()),
        };

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to construct shared HTTP client")?;

        Ok(Self {
            backend,
            gemini,
            openai,
            locale,
            http_client,
            timeout,
        })
    }

    /// Selected backend.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Language of user-facing messages.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Timeout applied to grading requests.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Model identifier of the selected backend.
    pub fn model(&self) -> &str {
        match self.backend {
            Backend::Gemini => &self.gemini.model,
            Backend::OpenAi => &self.openai.model,
        }
    }

    /// Returns a clone of the shared reqwest HTTP client.
    pub fn http_client(&self) -> Client {
        self.http_client.clone()
    }

    /// The command-line override if given, else the configured backend.
    pub fn resolve_backend(&self, requested: Option<Backend>) -> Backend {
        requested.unwrap_or(self.backend)
    }

    /// Constructs the selected backend. Fails when its credential is missing.
    pub fn service(&self) -> Result<Arc<dyn GradingService>> {
        self.service_for(self.backend, self.locale)
    }

    /// Constructs `backend` prompting in `locale`, e.g. when either is
    /// overridden on the command line.
    pub fn service_for(
        &self,
        backend: Backend,
        locale: Locale,
    ) -> Result<Arc<dyn GradingService>> {
        match backend {
            Backend::Gemini => {
                let Some(api_key) = self.gemini.api_key.clone() else {
                    bail!("GEMINI_API_KEY (or API_KEY) must be set to grade with Gemini.");
                };
                Ok(Arc::new(
                    GeminiGrader::builder()
                        .api_key(api_key)
                        .api_base(self.gemini.api_base.clone())
                        .model(self.gemini.model.clone())
                        .temperature(self.gemini.temperature)
                        .locale(locale)
                        .http(self.http_client())
                        .build(),
                ))
            }
            Backend::OpenAi => {
                let Some(api_key) = self.openai.api_key.clone() else {
                    bail!("OPENAI_API_KEY must be set to grade with an OpenAI-compatible endpoint.");
                };
                Ok(Arc::new(
                    OpenAiGrader::new(&self.openai.api_base, api_key, &self.openai.model)
                        .with_http_client(self.http_client())
                        .with_temperature(self.openai.temperature)
                        .with_locale(locale),
                ))
            }
        }
    }
}

/// Global storage for the lazily constructed configuration.
static CONFIG_SLOT: OnceLock<Arc<Config>> = OnceLock::new();

/// Ensure the global configuration has been initialized and return it.
pub fn ensure_initialized() -> Result<Arc<Config>> {
    if let Some(cfg) = CONFIG_SLOT.get() {
        return Ok(Arc::clone(cfg));
    }
    let cfg = Arc::new(Config::from_env()?);
    Ok(Arc::clone(CONFIG_SLOT.get_or_init(|| cfg)))
}
