//! Write path for FAQ records.
//!
//! Every mutation goes through `FaqAdmin`, which persists the change and then
//! invalidates the field and response caches for the record before returning.
//! Creation translates; updates never do.

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::cache::{FieldCache, ResponseCache};
use crate::error::FaqError;
use crate::model::{FaqId, FaqRecord, FaqUpdate, NewFaq};
use crate::store::RecordStore;
use crate::translation::TranslationOrchestrator;

/// Admin listing filter. Both criteria are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminFilter {
    pub active: Option<bool>,
    /// Case-insensitive match over question, answer and translated questions.
    pub search: Option<String>,
}

impl AdminFilter {
    fn matches(&self, record: &FaqRecord) -> bool {
        if let Some(active) = self.active {
            if record.is_active != active {
                return false;
            }
        }

        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();

        record.question.to_lowercase().contains(&term)
            || record.answer.to_lowercase().contains(&term)
            || record.translations.values().any(|translation| {
                translation
                    .question
                    .as_deref()
                    .is_some_and(|question| question.to_lowercase().contains(&term))
            })
    }
}

pub struct FaqAdmin {
    store: Arc<dyn RecordStore>,
    orchestrator: Arc<TranslationOrchestrator>,
    fields: Arc<FieldCache>,
    responses: Arc<ResponseCache>,
}

impl FaqAdmin {
    pub fn new(
        store: Arc<dyn RecordStore>,
        orchestrator: Arc<TranslationOrchestrator>,
        fields: Arc<FieldCache>,
        responses: Arc<ResponseCache>,
    ) -> Self {
        Self {
            store,
            orchestrator,
            fields,
            responses,
        }
    }

    /// Validate, translate the missing target fields, then persist.
    pub async fn create(&self, faq: NewFaq) -> Result<FaqRecord, FaqError> {
        faq.validate()?;

        let faq = self.orchestrator.translate_new(faq).await;
        let record = self.store.create(faq).await?;
        self.invalidate(record.id).await;

        info!("Created FAQ {}: {}", record.id, record.label());
        Ok(record)
    }

    /// Apply a partial update. No translation is performed.
    pub async fn update(&self, id: FaqId, changes: FaqUpdate) -> Result<FaqRecord, FaqError> {
        changes.validate()?;

        let record = self
            .store
            .update(id, &changes)
            .await?
            .ok_or(FaqError::NotFound(id))?;
        self.invalidate(id).await;

        info!("Updated FAQ {}", id);
        Ok(record)
    }

    pub async fn delete(&self, id: FaqId) -> Result<(), FaqError> {
        if !self.store.delete(id).await? {
            return Err(FaqError::NotFound(id));
        }
        self.invalidate(id).await;

        info!("Deleted FAQ {}", id);
        Ok(())
    }

    /// Regenerate every translation from the current English text, overwriting
    /// what is stored.
    pub async fn retranslate(&self, id: FaqId) -> Result<FaqRecord, FaqError> {
        let current = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(FaqError::NotFound(id))?;

        let changes = FaqUpdate {
            translations: self.orchestrator.retranslate(&current).await,
            ..FaqUpdate::default()
        };

        let record = self
            .store
            .update(id, &changes)
            .await?
            .ok_or(FaqError::NotFound(id))?;
        self.invalidate(id).await;

        Ok(record)
    }

    /// Drop every cached value derived from the record without modifying the
    /// store. Unknown ids are reported like the other record actions.
    pub async fn clear_cache(&self, id: FaqId) -> Result<(), FaqError> {
        if self.store.get_by_id(id).await?.is_none() {
            return Err(FaqError::NotFound(id));
        }
        self.invalidate(id).await;

        info!("Cleared cache for FAQ {}", id);
        Ok(())
    }

    /// All records including inactive ones, newest first.
    pub async fn list_all(&self, filter: &AdminFilter) -> Result<Vec<FaqRecord>, FaqError> {
        let records = self.store.list_all().await?;
        Ok(records.into_iter().filter(|record| filter.matches(record)).collect())
    }

    pub async fn search(&self, term: &str) -> Result<Vec<FaqRecord>, FaqError> {
        let filter = AdminFilter {
            active: None,
            search: Some(term.to_string()),
        };
        self.list_all(&filter).await
    }

    async fn invalidate(&self, id: FaqId) {
        self.fields.invalidate(id).await;
        self.responses.invalidate_all().await;
        self.responses.invalidate_detail(id).await;
    }
}
