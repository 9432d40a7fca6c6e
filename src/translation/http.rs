use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{TranslationError, TranslationProvider};
use crate::i18n::Language;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for a chat-completions translation endpoint.
#[derive(Debug, Clone)]
pub struct HttpTranslatorConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    /// Upper bound for one attempt, including reading the body.
    pub timeout: Duration,
    pub max_completion_tokens: u32,
}

impl HttpTranslatorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(10),
            max_completion_tokens: 2000,
        }
    }
}

/// OpenAI Chat Completion request for translation
#[derive(Debug, Serialize)]
struct TranslationRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Reasoning models reject `temperature` and take `reasoning_effort` instead.
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

fn build_system_prompt(target_language: Language) -> String {
    format!(
        r#"You are a professional translator for a customer support FAQ. Translate the text from English to {} ({}).

## Rules
- Output only the translated text, with no preamble or explanation
- Preserve every HTML tag and attribute exactly as written; translate only the text between tags
- Do not translate URLs, email addresses, product names or code
- Keep acronyms and widely used technical terms in English
- Keep the tone clear, polite and concise"#,
        target_language.name(),
        target_language.native_name()
    )
}

/// Translation provider backed by an OpenAI-compatible chat completions API.
///
/// Each call makes exactly one request bounded by the configured timeout.
/// Failures are returned to the orchestrator, which falls back to English.
pub struct HttpTranslator {
    client: reqwest::Client,
    config: HttpTranslatorConfig,
}

impl HttpTranslator {
    pub fn new(config: HttpTranslatorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn build_request(&self, text: &str, target: Language) -> TranslationRequest {
        let is_reasoning = is_reasoning_model(&self.config.model);

        TranslationRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_system_prompt(target),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            max_completion_tokens: self.config.max_completion_tokens,
            temperature: if is_reasoning { None } else { Some(0.3) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
        }
    }

    async fn send(&self, request: &TranslationRequest) -> Result<String, TranslationError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| TranslationError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(TranslationError::Provider { status, body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::Request(format!("invalid response body: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(TranslationError::EmptyResponse)
    }
}

#[async_trait]
impl TranslationProvider for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        target_lang: &str,
    ) -> Result<Option<String>, TranslationError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let target = Language::from_code(target_lang)
            .map_err(|_| TranslationError::UnsupportedLanguage(target_lang.to_string()))?;
        if target.is_canonical() {
            return Ok(Some(text.to_string()));
        }

        let request = self.build_request(text, target);
        debug!("Requesting {} translation from {}", target.name(), self.config.model);

        match tokio::time::timeout(self.config.timeout, self.send(&request)).await {
            Ok(result) => result.map(Some),
            Err(_) => Err(TranslationError::Timeout(self.config.timeout)),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
