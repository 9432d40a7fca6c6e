use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{keys, CacheBackend, CacheEpoch, EpochToken};
use crate::error::FaqError;
use crate::i18n::{Language, TranslationMetrics};
use crate::model::{FaqField, FaqId, FaqRecord};
use crate::store::RecordStore;

/// Read-through cache of translated field values.
///
/// Only real translations are cached. The English source is never cached
/// (it is always on the record), and an English fallback served for a
/// missing translation is not cached either, so a translation added later is
/// picked up on the next read.
///
/// A value is only written back when no invalidation happened between the
/// epoch token and the write, so a read that loaded the record before an
/// update cannot repopulate the old value afterwards.
pub struct FieldCache {
    backend: Arc<dyn CacheBackend>,
    store: Arc<dyn RecordStore>,
    ttl: Duration,
    metrics: Arc<TranslationMetrics>,
    epoch: Arc<CacheEpoch>,
}

impl FieldCache {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        store: Arc<dyn RecordStore>,
        ttl: Duration,
        metrics: Arc<TranslationMetrics>,
        epoch: Arc<CacheEpoch>,
    ) -> Self {
        Self {
            backend,
            store,
            ttl,
            metrics,
            epoch,
        }
    }

    /// Token to take before loading a record that will be passed to `resolve`.
    pub async fn token(&self) -> EpochToken {
        self.epoch.token().await
    }

    /// Value of `field` for record `id` in `lang`, loading the record from the
    /// store only on a cache miss.
    pub async fn get(&self, id: FaqId, field: FaqField, lang: Language) -> Result<String, FaqError> {
        if lang.is_canonical() {
            let record = self.load(id).await?;
            return Ok(record.english(field).to_string());
        }

        let key = keys::field_key(id, field, lang.code());
        if let Some(value) = self.lookup(&key).await {
            return Ok(value);
        }

        let token = self.token().await;
        let record = self.load(id).await?;
        Ok(self.populate(&key, &record, field, lang, token).await)
    }

    /// Same lookup as `get` for a caller that already holds the record.
    /// `token` must have been taken before the record was loaded.
    pub async fn resolve(
        &self,
        record: &FaqRecord,
        field: FaqField,
        lang: Language,
        token: EpochToken,
    ) -> String {
        if lang.is_canonical() {
            return record.english(field).to_string();
        }

        let key = keys::field_key(record.id, field, lang.code());
        if let Some(value) = self.lookup(&key).await {
            return value;
        }

        self.populate(&key, record, field, lang, token).await
    }

    /// Drop every (field, language) entry for the record.
    pub async fn invalidate(&self, id: FaqId) {
        let keys: Vec<String> = Language::all_enabled()
            .into_iter()
            .flat_map(|lang| {
                FaqField::ALL
                    .into_iter()
                    .map(move |field| keys::field_key(id, field, lang.code()))
            })
            .collect();

        let _epoch = self.epoch.advance().await;
        if let Err(e) = self.backend.delete_many(&keys).await {
            self.metrics.record_cache_error();
            warn!("Field cache invalidation for FAQ {} failed: {}", id, e);
        } else {
            debug!("Invalidated {} field cache entries for FAQ {}", keys.len(), id);
        }
    }

    async fn load(&self, id: FaqId) -> Result<FaqRecord, FaqError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(FaqError::NotFound(id))
    }

    async fn lookup(&self, key: &str) -> Option<String> {
        match self.backend.get(key).await {
            Ok(Some(value)) => {
                self.metrics.record_field_hit();
                Some(value)
            }
            Ok(None) => {
                self.metrics.record_field_miss();
                None
            }
            Err(e) => {
                self.metrics.record_cache_error();
                self.metrics.record_field_miss();
                warn!("Field cache read for {} failed, using store: {}", key, e);
                None
            }
        }
    }

    async fn populate(
        &self,
        key: &str,
        record: &FaqRecord,
        field: FaqField,
        lang: Language,
        token: EpochToken,
    ) -> String {
        match record.translated(field, lang.code()) {
            Some(text) => {
                let value = text.to_string();
                if let Some(_epoch) = self.epoch.fill_guard(token).await {
                    if let Err(e) = self.backend.set(key, value.clone(), self.ttl).await {
                        self.metrics.record_cache_error();
                        warn!("Field cache write for {} failed: {}", key, e);
                    }
                }
                value
            }
            None => {
                debug!(
                    "No {} translation of {} for FAQ {}, serving English",
                    lang.name(),
                    field,
                    record.id
                );
                record.english(field).to_string()
            }
        }
    }
}
