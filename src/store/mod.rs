//! Durable record storage for FAQ entries.
//!
//! The store is the single source of truth. Caches sit in front of it and may
//! always be rebuilt from it. Implementations must replace a record atomically
//! on write so no reader observes a half-applied update.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{FaqId, FaqRecord, FaqUpdate, NewFaq};

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record, assigning its id and timestamps.
    async fn create(&self, faq: NewFaq) -> Result<FaqRecord>;

    /// Apply `changes` to an existing record. Returns `None` if the id is unknown.
    async fn update(&self, id: FaqId, changes: &FaqUpdate) -> Result<Option<FaqRecord>>;

    async fn get_by_id(&self, id: FaqId) -> Result<Option<FaqRecord>>;

    /// Active records, newest first.
    async fn list_active(&self) -> Result<Vec<FaqRecord>>;

    /// Every record including inactive ones, newest first.
    async fn list_all(&self) -> Result<Vec<FaqRecord>>;

    /// Remove a record. Returns `false` if the id is unknown.
    async fn delete(&self, id: FaqId) -> Result<bool>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Newest first, ties broken by the larger id.
pub(crate) fn sort_newest_first(records: &mut [FaqRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
