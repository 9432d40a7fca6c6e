//! Read path: language-resolved views over active FAQ records.

use std::sync::Arc;
use tracing::debug;

use crate::cache::{EpochToken, FieldCache, ResponseCache};
use crate::error::FaqError;
use crate::i18n::Language;
use crate::model::{FaqField, FaqId, FaqList, FaqRecord, FaqView};
use crate::store::RecordStore;

/// Serves list and detail views in the requested language.
///
/// Lookups go response cache, then store plus field cache. An absent or
/// unknown language code silently selects English. Epoch tokens are taken
/// before each store read so results built from a record that changed
/// mid-request are returned but not cached.
pub struct QueryService {
    store: Arc<dyn RecordStore>,
    fields: Arc<FieldCache>,
    responses: Arc<ResponseCache>,
}

impl QueryService {
    pub fn new(store: Arc<dyn RecordStore>, fields: Arc<FieldCache>, responses: Arc<ResponseCache>) -> Self {
        Self {
            store,
            fields,
            responses,
        }
    }

    /// Active records, newest first.
    pub async fn list(&self, lang: Option<&str>) -> Result<FaqList, FaqError> {
        let lang = Language::resolve(lang);
        if let Some(cached) = self.responses.get_list(lang).await {
            return Ok(cached);
        }

        let tokens = self.tokens().await;
        let records = self.store.list_active().await?;
        let mut results = Vec::with_capacity(records.len());
        for record in &records {
            results.push(self.view(record, lang, tokens.0).await);
        }

        let list = FaqList::new(results);
        self.responses.set_list(lang, &list, tokens.1).await;
        debug!("Built FAQ list for {} with {} entries", lang, list.count);
        Ok(list)
    }

    /// One active record. Inactive records are reported as not found.
    pub async fn retrieve(&self, id: FaqId, lang: Option<&str>) -> Result<FaqView, FaqError> {
        let lang = Language::resolve(lang);
        if let Some(cached) = self.responses.get_detail(id, lang).await {
            return Ok(cached);
        }

        let tokens = self.tokens().await;
        let record = self
            .store
            .get_by_id(id)
            .await?
            .filter(|record| record.is_active)
            .ok_or(FaqError::NotFound(id))?;

        let view = self.view(&record, lang, tokens.0).await;
        self.responses.set_detail(id, lang, &view, tokens.1).await;
        Ok(view)
    }

    /// The question of record `id` in `lang`, English when untranslated.
    pub async fn question(&self, id: FaqId, lang: Option<&str>) -> Result<String, FaqError> {
        self.fields.get(id, FaqField::Question, Language::resolve(lang)).await
    }

    /// The answer of record `id` in `lang`, English when untranslated.
    pub async fn answer(&self, id: FaqId, lang: Option<&str>) -> Result<String, FaqError> {
        self.fields.get(id, FaqField::Answer, Language::resolve(lang)).await
    }

    /// Field and response tokens, in that order.
    async fn tokens(&self) -> (EpochToken, EpochToken) {
        (self.fields.token().await, self.responses.token().await)
    }

    async fn view(&self, record: &FaqRecord, lang: Language, token: EpochToken) -> FaqView {
        FaqView {
            id: record.id,
            question: self.fields.resolve(record, FaqField::Question, lang, token).await,
            answer: self.fields.resolve(record, FaqField::Answer, lang, token).await,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
