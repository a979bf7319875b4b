// ============================================================
// Layer 6 - Generative Answer Client
// ============================================================
// Optional answer source for the chat surface. Instead of picking
// a canned answer it sends a policy document plus the question to
// a Gemini-style `generateContent` endpoint:
//
//   POST {base_url}/models/{model}:generateContent?key={api_key}
//   { "contents": [ { "parts": [ { "text": "<prompt>" } ] } ] }
//
//   → { "candidates": [ { "content": { "parts": [ { "text": "..." } ] } } ] }
//
// The API key comes from CHATBOT_API_KEY; without it the chat
// refuses to start in generative mode.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::error::{ChatbotError, ChatbotResult};
use crate::domain::language::Language;
use crate::domain::session::{ConversationMode, FALLBACK_APOLOGY};
use crate::domain::traits::QuestionAnswerer;

pub const API_KEY_ENV:      &str = "CHATBOT_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL:    &str = "gemini-1.5-flash";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

pub struct GenerativeClient {
    client:   reqwest::blocking::Client,
    base_url: String,
    model:    String,
    api_key:  String,
    policy:   String,
}

impl GenerativeClient {
    pub fn new(
        api_key:  impl Into<String>,
        base_url: impl Into<String>,
        model:    impl Into<String>,
        policy:   impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            bail!("API key is missing. Set {API_KEY_ENV} to use the generative answer source.");
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Cannot build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model:    model.into(),
            api_key,
            policy:   policy.into(),
        })
    }

    /// Read the policy document the model answers from.
    pub fn load_policy(path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .with_context(|| format!("Cannot read policy document '{}'", path.display()))
    }

    pub fn build_prompt(&self, question: &str, language: Language, mode: ConversationMode) -> String {
        let mut prompt = format!(
            "You are a customer support assistant. Answer the question using only \
             the policy document below. If the answer is not in the document, say so.\n\n\
             Policy document:\n{}\n\nQuestion: {}{}",
            self.policy.trim(),
            question.trim(),
            mode.prompt_suffix(),
        );
        if !language.is_working_language() {
            prompt.push_str(&format!(" Please answer in {}.", language.name()));
        }
        prompt
    }

    pub fn generate(&self, prompt: &str) -> ChatbotResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| ChatbotError::Generative(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(ChatbotError::Generative(format!("HTTP {status}: {detail}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ChatbotError::Generative(format!("bad response body: {e}")))?;
        first_candidate_text(parsed)
    }
}

fn first_candidate_text(response: GenerateResponse) -> ChatbotResult<String> {
    response
        .candidates
        .into_iter()
        .next()
        .map(|c| c.content.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join(""))
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ChatbotError::Generative("response had no candidates".to_string()))
}

impl QuestionAnswerer for GenerativeClient {
    fn answer(&self, question: &str, language: Language, mode: ConversationMode) -> String {
        if question.trim().is_empty() {
            return FALLBACK_APOLOGY.to_string();
        }
        let prompt = self.build_prompt(question, language, mode);
        match self.generate(&prompt) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Generative answer failed: {e}");
                FALLBACK_APOLOGY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GenerativeClient {
        GenerativeClient::new("test-key", "http://127.0.0.1:9/v1beta/", DEFAULT_MODEL, "Rates are 12%.").unwrap()
    }

    #[test]
    fn test_missing_key_is_rejected() {
        assert!(GenerativeClient::new("  ", DEFAULT_BASE_URL, DEFAULT_MODEL, "").is_err());
    }

    #[test]
    fn test_prompt_carries_policy_question_and_mode() {
        let prompt = client().build_prompt("What is the rate?", Language::English, ConversationMode::Concise);
        assert!(prompt.contains("Rates are 12%."));
        assert!(prompt.ends_with("Question: What is the rate? Please provide a very brief and to-the-point answer."));
    }

    #[test]
    fn test_prompt_asks_for_customer_language() {
        let prompt = client().build_prompt("rate?", Language::Hindi, ConversationMode::Standard);
        assert!(prompt.ends_with("Please answer in Hindi."));
    }

    #[test]
    fn test_first_candidate_text() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(first_candidate_text(parsed).unwrap(), "Hello there");

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(first_candidate_text(empty), Err(ChatbotError::Generative(_))));
    }

    #[test]
    fn test_unreachable_service_degrades_to_apology() {
        let reply = client().answer("What is the rate?", Language::English, ConversationMode::Standard);
        assert_eq!(reply, FALLBACK_APOLOGY);
    }
}
