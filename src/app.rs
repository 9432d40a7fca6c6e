//! Wiring of store, caches, translator and services into one application.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::admin::FaqAdmin;
use crate::cache::{CacheBackend, CacheEpoch, FieldCache, InMemoryCache, NoopCache, ResponseCache};
use crate::config::{CacheBackendKind, Config};
use crate::i18n::{Language, TranslationMetrics};
use crate::query::QueryService;
use crate::store::{InMemoryStore, PgStore, RecordStore};
use crate::translation::{
    DisabledTranslator, HttpTranslator, TranslationOrchestrator, TranslationProvider,
};

/// The assembled service. Cheap to clone; every component is shared.
#[derive(Clone)]
pub struct FaqApp {
    pub query: Arc<QueryService>,
    pub admin: Arc<FaqAdmin>,
    pub metrics: Arc<TranslationMetrics>,
    /// Set when the in-memory backend is in use, so expired entries can be swept.
    pub memory_cache: Option<Arc<InMemoryCache>>,
}

impl FaqApp {
    /// Build the services around explicit components.
    pub fn assemble(
        store: Arc<dyn RecordStore>,
        backend: Arc<dyn CacheBackend>,
        provider: Arc<dyn TranslationProvider>,
        languages: Vec<Language>,
        ttl: Duration,
    ) -> Self {
        let metrics = Arc::new(TranslationMetrics::new());
        let epoch = Arc::new(CacheEpoch::new());

        let fields = Arc::new(FieldCache::new(
            backend.clone(),
            store.clone(),
            ttl,
            metrics.clone(),
            epoch.clone(),
        ));
        let responses = Arc::new(ResponseCache::new(backend, ttl, metrics.clone(), epoch));
        let orchestrator = Arc::new(TranslationOrchestrator::new(
            provider,
            languages,
            metrics.clone(),
        ));

        Self {
            query: Arc::new(QueryService::new(
                store.clone(),
                fields.clone(),
                responses.clone(),
            )),
            admin: Arc::new(FaqAdmin::new(store, orchestrator, fields, responses)),
            metrics,
            memory_cache: None,
        }
    }

    /// Build the application from configuration, connecting to PostgreSQL
    /// when a database URL is set.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn RecordStore> = match &config.database_url {
            Some(url) => Arc::new(
                PgStore::connect(url)
                    .await
                    .context("Failed to initialize PostgreSQL store")?,
            ),
            None => {
                warn!("DATABASE_URL not set, records are kept in memory only");
                Arc::new(InMemoryStore::new())
            }
        };

        let (backend, memory_cache): (Arc<dyn CacheBackend>, Option<Arc<InMemoryCache>>) =
            match config.cache_backend {
                CacheBackendKind::Memory => {
                    let cache = Arc::new(InMemoryCache::new());
                    let backend: Arc<dyn CacheBackend> = cache.clone();
                    (backend, Some(cache))
                }
                CacheBackendKind::None => (Arc::new(NoopCache), None),
            };

        let provider: Arc<dyn TranslationProvider> = match config.translator() {
            Some(translator) => Arc::new(HttpTranslator::new(translator)),
            None => {
                warn!("TRANSLATOR_API_KEY not set, new FAQs will copy English into every language");
                Arc::new(DisabledTranslator)
            }
        };

        info!(
            "Store: {}, cache: {} (ttl {}s), translator: {}, languages: {:?}",
            store.name(),
            backend.name(),
            config.cache_ttl.as_secs(),
            provider.name(),
            config.languages.iter().map(|lang| lang.code()).collect::<Vec<_>>()
        );

        let mut app = Self::assemble(
            store,
            backend,
            provider,
            config.languages.clone(),
            config.cache_ttl,
        );
        app.memory_cache = memory_cache;
        Ok(app)
    }
}
