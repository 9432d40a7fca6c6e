//! Machine translation of FAQ content.
//!
//! `TranslationProvider` is the adapter seam to an external service. The
//! `TranslationOrchestrator` drives it at creation time and turns every failure
//! into an explicit English fallback, so no translation error ever reaches the
//! caller of a write.

mod http;
mod orchestrator;

pub use http::{HttpTranslator, HttpTranslatorConfig, DEFAULT_API_URL, DEFAULT_MODEL};
pub use orchestrator::TranslationOrchestrator;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("unsupported target language '{0}'")]
    UnsupportedLanguage(String),

    #[error("translation provider is not configured")]
    Disabled,

    #[error("translation request failed: {0}")]
    Request(String),

    #[error("translation provider error ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("translation timed out after {0:?}")]
    Timeout(Duration),

    #[error("translation response contained no text")]
    EmptyResponse,
}

/// External translation service.
///
/// Empty or whitespace-only input yields `Ok(None)`; it is not an error.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        target_lang: &str,
    ) -> Result<Option<String>, TranslationError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Provider used when no translator API key is configured. Every attempt
/// fails, so creation falls back to English for all targets.
#[derive(Debug, Default)]
pub struct DisabledTranslator;

#[async_trait]
impl TranslationProvider for DisabledTranslator {
    async fn translate(
        &self,
        text: &str,
        _target_lang: &str,
    ) -> Result<Option<String>, TranslationError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        Err(TranslationError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}
