use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{keys, CacheBackend, CacheEpoch, EpochToken};
use crate::error::CacheError;
use crate::i18n::{Language, TranslationMetrics};
use crate::model::{FaqId, FaqList, FaqView};

/// Cache of whole serialized API payloads.
///
/// Payloads are stored as JSON snapshots and replaced wholesale; nothing is
/// patched in place. Keys use the resolved language, so a request for an
/// unknown language shares the English entry and is covered by invalidation.
/// Setters take the epoch token observed before the payload's store read and
/// drop the write if an invalidation ran since.
pub struct ResponseCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    metrics: Arc<TranslationMetrics>,
    epoch: Arc<CacheEpoch>,
}

impl ResponseCache {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        ttl: Duration,
        metrics: Arc<TranslationMetrics>,
        epoch: Arc<CacheEpoch>,
    ) -> Self {
        Self {
            backend,
            ttl,
            metrics,
            epoch,
        }
    }

    pub async fn token(&self) -> EpochToken {
        self.epoch.token().await
    }

    pub async fn get_list(&self, lang: Language) -> Option<FaqList> {
        self.fetch(&keys::list_key(lang.code())).await
    }

    pub async fn set_list(&self, lang: Language, payload: &FaqList, token: EpochToken) {
        self.store(&keys::list_key(lang.code()), payload, token).await;
    }

    pub async fn get_detail(&self, id: FaqId, lang: Language) -> Option<FaqView> {
        self.fetch(&keys::detail_key(id, lang.code())).await
    }

    pub async fn set_detail(&self, id: FaqId, lang: Language, payload: &FaqView, token: EpochToken) {
        self.store(&keys::detail_key(id, lang.code()), payload, token).await;
    }

    /// Drop the list payload of every language.
    pub async fn invalidate_all(&self) {
        let keys: Vec<String> = Language::all_enabled()
            .into_iter()
            .map(|lang| keys::list_key(lang.code()))
            .collect();
        self.drop_keys(&keys, "list").await;
    }

    /// Drop the detail payload of one record in every language.
    pub async fn invalidate_detail(&self, id: FaqId) {
        let keys: Vec<String> = Language::all_enabled()
            .into_iter()
            .map(|lang| keys::detail_key(id, lang.code()))
            .collect();
        self.drop_keys(&keys, "detail").await;
    }

    async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let decoded = match self.backend.get(key).await {
            Ok(Some(raw)) => serde_json::from_str::<T>(&raw).map_err(CacheError::from),
            Ok(None) => {
                self.metrics.record_response_miss();
                return None;
            }
            Err(e) => Err(e),
        };

        match decoded {
            Ok(payload) => {
                self.metrics.record_response_hit();
                Some(payload)
            }
            Err(e) => {
                self.metrics.record_cache_error();
                self.metrics.record_response_miss();
                warn!("Response cache read for {} failed, rebuilding: {}", key, e);
                if matches!(e, CacheError::Corrupt(_)) {
                    if let Err(e) = self.backend.delete(key).await {
                        self.metrics.record_cache_error();
                        warn!("Could not drop corrupt response entry {}: {}", key, e);
                    }
                }
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &str, payload: &T, token: EpochToken) {
        let raw = match serde_json::to_string(payload) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not serialize payload for {}: {}", key, e);
                return;
            }
        };

        let Some(_epoch) = self.epoch.fill_guard(token).await else {
            return;
        };
        if let Err(e) = self.backend.set(key, raw, self.ttl).await {
            self.metrics.record_cache_error();
            warn!("Response cache write for {} failed: {}", key, e);
        }
    }

    async fn drop_keys(&self, keys: &[String], kind: &str) {
        let _epoch = self.epoch.advance().await;
        match self.backend.delete_many(keys).await {
            Ok(()) => debug!("Invalidated {} {} response entries", keys.len(), kind),
            Err(e) => {
                self.metrics.record_cache_error();
                warn!("Response cache {} invalidation failed: {}", kind, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use async_trait::async_trait;
    use chrono::Utc;

    const TTL: Duration = Duration::from_secs(3600);

    fn view(id: i64, question: &str) -> FaqView {
        let now = Utc::now();
        FaqView {
            id: FaqId(id),
            question: question.to_string(),
            answer: "<p>A</p>".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn cache() -> (ResponseCache, Arc<InMemoryCache>, Arc<TranslationMetrics>) {
        let backend = Arc::new(InMemoryCache::new());
        let metrics = Arc::new(TranslationMetrics::new());
        (
            ResponseCache::new(backend.clone(), TTL, metrics.clone(), Arc::new(CacheEpoch::new())),
            backend,
            metrics,
        )
    }

    #[tokio::test]
    async fn test_list_roundtrip_per_language() {
        let (cache, _, metrics) = cache();
        let hindi = FaqList::new(vec![view(1, "यह सेवा क्या है?")]);

        assert!(cache.get_list(Language::HINDI).await.is_none());
        cache.set_list(Language::HINDI, &hindi, cache.token().await).await;

        assert_eq!(cache.get_list(Language::HINDI).await, Some(hindi));
        assert!(cache.get_list(Language::BENGALI).await.is_none());
        assert_eq!(metrics.response_cache_hits(), 1);
        assert_eq!(metrics.response_cache_misses(), 2);
    }

    #[tokio::test]
    async fn test_detail_roundtrip() {
        let (cache, _, _) = cache();
        let payload = view(3, "Q?");

        cache
            .set_detail(FaqId(3), Language::ENGLISH, &payload, cache.token().await)
            .await;
        assert_eq!(cache.get_detail(FaqId(3), Language::ENGLISH).await, Some(payload));
        assert!(cache.get_detail(FaqId(4), Language::ENGLISH).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_every_list() {
        let (cache, backend, _) = cache();
        let token = cache.token().await;
        for lang in Language::all_enabled() {
            cache.set_list(lang, &FaqList::new(vec![view(1, "Q?")]), token).await;
        }
        cache.set_detail(FaqId(1), Language::HINDI, &view(1, "Q?"), token).await;

        cache.invalidate_all().await;

        for lang in Language::all_enabled() {
            assert!(cache.get_list(lang).await.is_none());
        }
        assert_eq!(backend.len().await, 1, "detail entries are untouched");
    }

    #[tokio::test]
    async fn test_invalidate_detail_only_hits_one_record() {
        let (cache, _, _) = cache();
        let token = cache.token().await;
        cache.set_detail(FaqId(1), Language::HINDI, &view(1, "Q1"), token).await;
        cache.set_detail(FaqId(1), Language::BENGALI, &view(1, "Q1"), token).await;
        cache.set_detail(FaqId(2), Language::HINDI, &view(2, "Q2"), token).await;

        cache.invalidate_detail(FaqId(1)).await;

        assert!(cache.get_detail(FaqId(1), Language::HINDI).await.is_none());
        assert!(cache.get_detail(FaqId(1), Language::BENGALI).await.is_none());
        assert!(cache.get_detail(FaqId(2), Language::HINDI).await.is_some());
    }

    #[tokio::test]
    async fn test_payload_built_before_invalidation_is_discarded() {
        let (cache, backend, _) = cache();
        let token = cache.token().await;

        cache.invalidate_all().await;
        cache.set_list(Language::HINDI, &FaqList::new(vec![view(1, "old")]), token).await;

        cache.invalidate_detail(FaqId(1)).await;
        cache.set_detail(FaqId(1), Language::HINDI, &view(1, "old"), token).await;

        assert!(backend.is_empty().await);

        let fresh = cache.token().await;
        cache.set_list(Language::HINDI, &FaqList::new(vec![view(1, "new")]), fresh).await;
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_dropped() {
        let (cache, backend, metrics) = cache();
        backend
            .set(&keys::list_key("en"), "{not json".to_string(), TTL)
            .await
            .unwrap();

        assert!(cache.get_list(Language::ENGLISH).await.is_none());
        assert_eq!(metrics.cache_errors(), 1);
        assert!(backend.is_empty().await);
    }

    /// Always returns garbage and refuses deletes.
    struct UndeletableCache;

    #[async_trait]
    impl CacheBackend for UndeletableCache {
        async fn get(&self, _: &str) -> Result<Option<String>, CacheError> {
            Ok(Some("{not json".to_string()))
        }

        async fn set(&self, _: &str, _: String, _: Duration) -> Result<(), CacheError> {
            Ok(())
        }

        async fn delete(&self, _: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("read-only replica".to_string()))
        }

        async fn clear(&self) -> Result<(), CacheError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "undeletable"
        }
    }

    #[tokio::test]
    async fn test_failed_corrupt_entry_delete_is_counted() {
        let metrics = Arc::new(TranslationMetrics::new());
        let cache = ResponseCache::new(
            Arc::new(UndeletableCache),
            TTL,
            metrics.clone(),
            Arc::new(CacheEpoch::new()),
        );

        assert!(cache.get_detail(FaqId(1), Language::HINDI).await.is_none());
        assert_eq!(metrics.cache_errors(), 2);
        assert_eq!(metrics.response_cache_misses(), 1);
    }
}
