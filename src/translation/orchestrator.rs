use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{TranslationError, TranslationProvider};
use crate::i18n::{Language, TranslationMetrics, TranslationValidator};
use crate::model::{FaqField, FaqRecord, NewFaq, Translation};

/// Fills translation fields at creation time and on explicit re-translation.
///
/// Never fails: a field whose translation cannot be produced receives a copy
/// of the English source, so after orchestration every target field is
/// non-empty.
pub struct TranslationOrchestrator {
    provider: Arc<dyn TranslationProvider>,
    targets: Vec<Language>,
    metrics: Arc<TranslationMetrics>,
}

impl TranslationOrchestrator {
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        targets: Vec<Language>,
        metrics: Arc<TranslationMetrics>,
    ) -> Self {
        let targets = targets.into_iter().filter(|lang| !lang.is_canonical()).collect();
        Self {
            provider,
            targets,
            metrics,
        }
    }

    pub fn targets(&self) -> &[Language] {
        &self.targets
    }

    /// Generate every target field the creator left empty. Supplied
    /// translations are kept as they are.
    pub async fn translate_new(&self, mut faq: NewFaq) -> NewFaq {
        let jobs: Vec<(Language, FaqField)> = self
            .jobs()
            .filter(|(lang, field)| faq.translated(*field, lang.code()).is_none())
            .collect();

        if jobs.is_empty() {
            return faq;
        }

        let results = join_all(
            jobs.iter()
                .map(|&(lang, field)| self.translate_field(faq.english(field), lang, field)),
        )
        .await;

        for ((lang, field), value) in jobs.into_iter().zip(results) {
            faq.translations
                .entry(lang.code().to_string())
                .or_default()
                .set(field, value);
        }

        faq
    }

    /// Regenerate every target field from the record's current English text.
    /// The result is meant to overwrite the stored translations.
    pub async fn retranslate(&self, record: &FaqRecord) -> BTreeMap<String, Translation> {
        let jobs: Vec<(Language, FaqField)> = self.jobs().collect();

        let results = join_all(
            jobs.iter()
                .map(|&(lang, field)| self.translate_field(record.english(field), lang, field)),
        )
        .await;

        let mut translations: BTreeMap<String, Translation> = BTreeMap::new();
        for ((lang, field), value) in jobs.into_iter().zip(results) {
            translations
                .entry(lang.code().to_string())
                .or_default()
                .set(field, value);
        }

        info!(
            "Re-translated FAQ {} into {} language(s)",
            record.id,
            translations.len()
        );
        translations
    }

    fn jobs(&self) -> impl Iterator<Item = (Language, FaqField)> + '_ {
        self.targets
            .iter()
            .flat_map(|&lang| FaqField::ALL.into_iter().map(move |field| (lang, field)))
    }

    /// Translate one field, falling back to the source text on any failure.
    async fn translate_field(&self, source: &str, lang: Language, field: FaqField) -> String {
        self.metrics.record_translation_attempt();

        let failure = match self.provider.translate(source, lang.code()).await {
            Ok(Some(translated)) => {
                let report = TranslationValidator::validate(source, &translated);
                if report.has_errors() {
                    warn!(
                        "Rejected {} translation of {}: {:?}",
                        lang.name(),
                        field,
                        report.errors
                    );
                    TranslationError::EmptyResponse
                } else {
                    if report.has_warnings() {
                        warn!(
                            "Translation validation warnings for {} ({}): {:?}",
                            lang.name(),
                            field,
                            report.warnings
                        );
                    }
                    return translated;
                }
            }
            Ok(None) => TranslationError::EmptyResponse,
            Err(e) => e,
        };

        self.metrics.record_translation_failure();
        match failure {
            TranslationError::Disabled => {
                debug!("Translation disabled, copying English {} for {}", field, lang.name())
            }
            e => warn!(
                "Translation of {} to {} via {} failed, using English: {}",
                field,
                lang.name(),
                self.provider.name(),
                e
            ),
        }
        source.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::DisabledTranslator;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Prefixes text with the language code; fails for languages in `failing`.
    struct TaggingProvider {
        failing: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl TaggingProvider {
        fn new(failing: Vec<&'static str>) -> Self {
            Self {
                failing,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranslationProvider for TaggingProvider {
        async fn translate(
            &self,
            text: &str,
            target_lang: &str,
        ) -> Result<Option<String>, TranslationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.trim().is_empty() {
                return Ok(None);
            }
            if self.failing.contains(&target_lang) {
                return Err(TranslationError::Provider {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(Some(format!("[{}] {}", target_lang, text)))
        }

        fn name(&self) -> &'static str {
            "tagging"
        }
    }

    fn orchestrator(provider: Arc<dyn TranslationProvider>) -> (TranslationOrchestrator, Arc<TranslationMetrics>) {
        let metrics = Arc::new(TranslationMetrics::new());
        (
            TranslationOrchestrator::new(provider, Language::translation_targets(), metrics.clone()),
            metrics,
        )
    }

    #[tokio::test]
    async fn test_translate_new_fills_every_target() {
        let (orchestrator, metrics) = orchestrator(Arc::new(TaggingProvider::new(vec![])));

        let faq = orchestrator
            .translate_new(NewFaq::new("Hello, how are you?", "<p>I am fine, thank you.</p>"))
            .await;

        assert_eq!(faq.translated(FaqField::Question, "hi"), Some("[hi] Hello, how are you?"));
        assert_eq!(faq.translated(FaqField::Question, "bn"), Some("[bn] Hello, how are you?"));
        assert_eq!(faq.translated(FaqField::Answer, "hi"), Some("[hi] <p>I am fine, thank you.</p>"));
        assert_eq!(faq.translated(FaqField::Answer, "bn"), Some("[bn] <p>I am fine, thank you.</p>"));
        assert_eq!(metrics.translation_attempts(), 4);
        assert_eq!(metrics.translation_failures(), 0);
    }

    #[tokio::test]
    async fn test_failed_language_falls_back_to_english() {
        let (orchestrator, metrics) = orchestrator(Arc::new(TaggingProvider::new(vec!["bn"])));

        let faq = orchestrator.translate_new(NewFaq::new("Q?", "A")).await;

        assert_eq!(faq.translated(FaqField::Question, "hi"), Some("[hi] Q?"));
        assert_eq!(faq.translated(FaqField::Question, "bn"), Some("Q?"));
        assert_eq!(faq.translated(FaqField::Answer, "bn"), Some("A"));
        assert_eq!(metrics.translation_failures(), 2);
    }

    #[tokio::test]
    async fn test_supplied_translations_are_kept() {
        let provider = Arc::new(TaggingProvider::new(vec![]));
        let (orchestrator, _) = orchestrator(provider.clone());

        let faq = NewFaq::new("Q?", "A").with_translation(
            Language::HINDI,
            Translation {
                question: Some("हाथ से लिखा".to_string()),
                answer: None,
            },
        );
        let faq = orchestrator.translate_new(faq).await;

        assert_eq!(faq.translated(FaqField::Question, "hi"), Some("हाथ से लिखा"));
        assert_eq!(faq.translated(FaqField::Answer, "hi"), Some("[hi] A"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_disabled_provider_copies_english() {
        let (orchestrator, metrics) = orchestrator(Arc::new(DisabledTranslator));

        let faq = orchestrator.translate_new(NewFaq::new("Q?", "<p>A</p>")).await;

        for lang in ["hi", "bn"] {
            assert_eq!(faq.translated(FaqField::Question, lang), Some("Q?"));
            assert_eq!(faq.translated(FaqField::Answer, lang), Some("<p>A</p>"));
        }
        assert_eq!(metrics.translation_failures(), 4);
    }

    #[tokio::test]
    async fn test_blank_translation_is_rejected() {
        struct BlankProvider;

        #[async_trait]
        impl TranslationProvider for BlankProvider {
            async fn translate(&self, _: &str, _: &str) -> Result<Option<String>, TranslationError> {
                Ok(Some("   ".to_string()))
            }

            fn name(&self) -> &'static str {
                "blank"
            }
        }

        let (orchestrator, _) = orchestrator(Arc::new(BlankProvider));
        let faq = orchestrator.translate_new(NewFaq::new("Q?", "A")).await;
        assert_eq!(faq.translated(FaqField::Question, "hi"), Some("Q?"));
    }

    #[tokio::test]
    async fn test_retranslate_overwrites_and_is_idempotent() {
        let (orchestrator, _) = orchestrator(Arc::new(TaggingProvider::new(vec![])));
        let now = Utc::now();
        let mut translations = BTreeMap::new();
        translations.insert("hi".to_string(), Translation::new("old", "old"));
        let record = FaqRecord {
            id: crate::model::FaqId(9),
            question: "New question?".to_string(),
            answer: "New answer".to_string(),
            translations,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let first = orchestrator.retranslate(&record).await;
        let second = orchestrator.retranslate(&record).await;

        assert_eq!(first, second);
        assert_eq!(first["hi"], Translation::new("[hi] New question?", "[hi] New answer"));
        assert_eq!(first["bn"], Translation::new("[bn] New question?", "[bn] New answer"));
    }

    #[test]
    fn test_canonical_target_is_dropped() {
        let orchestrator = TranslationOrchestrator::new(
            Arc::new(DisabledTranslator),
            vec![Language::ENGLISH, Language::HINDI],
            Arc::new(TranslationMetrics::new()),
        );
        assert_eq!(orchestrator.targets(), &[Language::HINDI]);
    }
}
