// ============================================================
// Layer 6 - Translation Adapter
// ============================================================
// Moves text between a customer's language and the working
// language. The adapter owns the shortcuts (same language, blank
// text) so a backend is only called for real work:
//
//   TranslationAdapter ──► IdentityTranslator   (no service configured)
//                      └─► HttpTranslator       (LibreTranslate-style JSON API)
//
// The adapter reports failures as ChatbotError::TranslationService;
// the inference pipeline decides to pass the text through.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::{ChatbotError, ChatbotResult};
use crate::domain::language::Language;
use crate::domain::traits::Translator;

// ─── IdentityTranslator ──────────────────────────────────────────────────────
/// Returns its input. Used when no translation service is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, text: &str, _source: Language, _target: Language) -> ChatbotResult<String> {
        Ok(text.to_string())
    }
}

// ─── HttpTranslator ──────────────────────────────────────────────────────────

/// Request body for `POST /translate`.
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q:      &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Connection settings for an HTTP translation service.
#[derive(Debug, Clone)]
pub struct HttpTranslatorConfig {
    /// Full URL of the translate endpoint, e.g. `http://localhost:5000/translate`
    pub endpoint:    String,
    pub api_key:     Option<String>,
    pub timeout:     Duration,
    /// Extra attempts after the first failure. 0 disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further attempt.
    pub backoff:     Duration,
}

impl HttpTranslatorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint:    endpoint.into(),
            api_key:     None,
            timeout:     Duration::from_secs(10),
            max_retries: 0,
            backoff:     Duration::from_millis(250),
        }
    }
}

pub struct HttpTranslator {
    client: reqwest::blocking::Client,
    config: HttpTranslatorConfig,
}

impl HttpTranslator {
    pub fn new(config: HttpTranslatorConfig) -> ChatbotResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatbotError::TranslationService(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn request_once(&self, text: &str, source: Language, target: Language) -> ChatbotResult<String> {
        let body = TranslateRequest {
            q:       text,
            source:  source.code(),
            target:  target.code(),
            format:  "text",
            api_key: self.config.api_key.as_deref(),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .map_err(|e| ChatbotError::TranslationService(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(ChatbotError::TranslationService(format!("HTTP {status}: {detail}")));
        }

        let parsed: TranslateResponse = response
            .json()
            .map_err(|e| ChatbotError::TranslationService(format!("bad response body: {e}")))?;
        Ok(parsed.translated_text)
    }
}

impl Translator for HttpTranslator {
    fn translate(&self, text: &str, source: Language, target: Language) -> ChatbotResult<String> {
        retry_with_backoff(self.config.max_retries, self.config.backoff, || {
            self.request_once(text, source, target)
        })
    }
}

/// Run `attempt` once plus up to `max_retries` more times, sleeping
/// `backoff`, `2 * backoff`, ... between tries. Returns the last error.
fn retry_with_backoff<T>(
    max_retries: u32,
    backoff:     Duration,
    mut attempt: impl FnMut() -> ChatbotResult<T>,
) -> ChatbotResult<T> {
    let mut delay = backoff;
    let mut tries = 0;
    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) if tries < max_retries => {
                tries += 1;
                tracing::debug!("Translation attempt {} failed ({e}); retrying in {:?}", tries, delay);
                std::thread::sleep(delay);
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

// ─── TranslationAdapter ──────────────────────────────────────────────────────
pub struct TranslationAdapter {
    backend: Box<dyn Translator>,
}

impl TranslationAdapter {
    pub fn new(backend: Box<dyn Translator>) -> Self {
        Self { backend }
    }

    /// An adapter that never leaves the process.
    pub fn identity() -> Self {
        Self::new(Box::new(IdentityTranslator))
    }

    /// Translate `text` from `source` to `target`.
    ///
    /// Same-language requests and blank text come back unchanged
    /// without touching the backend.
    pub fn translate(&self, text: &str, source: Language, target: Language) -> ChatbotResult<String> {
        if source == target || text.trim().is_empty() {
            return Ok(text.to_string());
        }
        self.backend.translate(text, source, target)
    }
}
