//! Advisory caches in front of the record store.
//!
//! - `FieldCache`: translated field values keyed by (record, field, language)
//! - `ResponseCache`: serialized list/detail payloads keyed by (view, language, record)
//!
//! Both wrap a pluggable `CacheBackend` and share one `CacheEpoch`, which keeps
//! a read that raced a write from refilling a key after it was invalidated.
//! A failing backend is never fatal: every error is logged, counted, and
//! treated as a miss so reads fall through to the store.

mod epoch;
mod field;
pub mod keys;
mod memory;
mod response;

pub use epoch::{CacheEpoch, EpochToken};
pub use field::FieldCache;
pub use memory::{InMemoryCache, NoopCache};
pub use response::ResponseCache;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CacheError;

/// Key/value cache with per-entry TTL. Writes are last-writer-wins.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn delete_many(&self, keys: &[String]) -> Result<(), CacheError> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }

    /// Drop every entry.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}
