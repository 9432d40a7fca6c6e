use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{sort_newest_first, RecordStore};
use crate::model::{FaqId, FaqRecord, FaqUpdate, NewFaq};

/// Process-local record store.
///
/// Updates clone the record, apply the changes and swap the whole value in
/// under the write lock, so readers only ever see complete records.
pub struct InMemoryStore {
    records: RwLock<HashMap<FaqId, FaqRecord>>,
    next_id: AtomicI64,
    reads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of read calls served (`get_by_id`, `list_active`, `list_all`).
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn create(&self, faq: NewFaq) -> Result<FaqRecord> {
        let id = FaqId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();

        let record = FaqRecord {
            id,
            question: faq.question,
            answer: faq.answer,
            translations: faq.translations,
            is_active: faq.is_active,
            created_at: now,
            updated_at: now,
        };

        self.records.write().await.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: FaqId, changes: &FaqUpdate) -> Result<Option<FaqRecord>> {
        let mut records = self.records.write().await;

        let Some(current) = records.get(&id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        changes.apply_to(&mut updated, Utc::now());
        records.insert(id, updated.clone());

        Ok(Some(updated))
    }

    async fn get_by_id(&self, id: FaqId) -> Result<Option<FaqRecord>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<FaqRecord>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let mut records: Vec<FaqRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.is_active)
            .cloned()
            .collect();

        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn list_all(&self) -> Result<Vec<FaqRecord>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let mut records: Vec<FaqRecord> = self.records.read().await.values().cloned().collect();

        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn delete(&self, id: FaqId) -> Result<bool> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::model::{FaqField, Translation};

    #[tokio::test]
    async fn test_create_assigns_sequential_ids_and_timestamps() {
        let store = InMemoryStore::new();

        let first = store.create(NewFaq::new("Q1?", "A1")).await.unwrap();
        let second = store.create(NewFaq::new("Q2?", "A2")).await.unwrap();

        assert_eq!(first.id, FaqId(1));
        assert_eq!(second.id, FaqId(2));
        assert_eq!(first.created_at, first.updated_at);
        assert!(first.is_active);
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let store = InMemoryStore::new();
        assert!(store.get_by_id(FaqId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_applies_changes() {
        let store = InMemoryStore::new();
        let record = store.create(NewFaq::new("Q?", "A")).await.unwrap();

        let updated = store
            .update(
                record.id,
                &FaqUpdate::default()
                    .question("New Q?")
                    .translation(Language::HINDI, Translation::new("नया", "उत्तर")),
            )
            .await
            .unwrap()
            .expect("Record should exist");

        assert_eq!(updated.question, "New Q?");
        assert_eq!(updated.translated(FaqField::Question, "hi"), Some("नया"));
        assert!(updated.updated_at >= record.updated_at);
        assert_eq!(updated.created_at, record.created_at);

        let stored = store.get_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let store = InMemoryStore::new();
        let result = store
            .update(FaqId(7), &FaqUpdate::default().active(false))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_active_filters_and_orders_newest_first() {
        let store = InMemoryStore::new();
        let older = store.create(NewFaq::new("Older?", "A")).await.unwrap();
        let hidden = store
            .create(NewFaq::new("Hidden?", "A").inactive())
            .await
            .unwrap();
        let newer = store.create(NewFaq::new("Newer?", "A")).await.unwrap();

        let active = store.list_active().await.unwrap();
        let ids: Vec<_> = active.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|r| r.id == hidden.id));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryStore::new();
        let record = store.create(NewFaq::new("Q?", "A")).await.unwrap();

        assert!(store.delete(record.id).await.unwrap());
        assert!(!store.delete(record.id).await.unwrap());
        assert!(store.get_by_id(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_count_tracks_reads_only() {
        let store = InMemoryStore::new();
        let record = store.create(NewFaq::new("Q?", "A")).await.unwrap();
        assert_eq!(store.read_count(), 0);

        store.get_by_id(record.id).await.unwrap();
        store.list_active().await.unwrap();
        assert_eq!(store.read_count(), 2);
    }
}
