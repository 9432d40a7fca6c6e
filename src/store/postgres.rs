use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

use super::RecordStore;
use crate::model::{FaqId, FaqRecord, FaqUpdate, NewFaq, Translation};

const FAQ_COLUMNS: &str = "id, question, answer, is_active, created_at, updated_at";

/// PostgreSQL-backed record store.
///
/// English content lives in `faqs`, one row per record; translations live in
/// `faq_translations`, one row per (record, language). Every write runs in a
/// single transaction and locks the record row first.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and create tables if they do not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables (safe to run always)
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS faqs (
                id BIGSERIAL PRIMARY KEY,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create faqs table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS faqs_active_created_idx
             ON faqs (is_active, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create faqs index")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS faq_translations (
                faq_id BIGINT NOT NULL REFERENCES faqs(id) ON DELETE CASCADE,
                lang TEXT NOT NULL,
                question TEXT,
                answer TEXT,
                PRIMARY KEY (faq_id, lang)
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create faq_translations table")?;

        info!("✓ FAQ schema ready");
        Ok(())
    }

    async fn list_where(&self, only_active: bool) -> Result<Vec<FaqRecord>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire database connection")?;

        let sql = if only_active {
            format!(
                "SELECT {} FROM faqs WHERE is_active ORDER BY created_at DESC, id DESC",
                FAQ_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM faqs ORDER BY created_at DESC, id DESC",
                FAQ_COLUMNS
            )
        };

        let rows = sqlx::query(&sql)
            .fetch_all(&mut *conn)
            .await
            .context("Failed to list FAQs")?;

        let mut records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>>>()?;

        attach_translations(&mut conn, &mut records).await?;
        Ok(records)
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn create(&self, faq: NewFaq) -> Result<FaqRecord> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query(
            "INSERT INTO faqs (question, answer, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING id",
        )
        .bind(&faq.question)
        .bind(&faq.answer)
        .bind(faq.is_active)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert FAQ")?;

        let id = FaqId(row.try_get("id")?);

        for (lang, translation) in &faq.translations {
            upsert_translation(&mut tx, id, lang, translation).await?;
        }

        let record = fetch_record(&mut tx, id)
            .await?
            .context("Inserted FAQ could not be read back")?;

        tx.commit().await.context("Failed to commit FAQ insert")?;
        Ok(record)
    }

    async fn update(&self, id: FaqId, changes: &FaqUpdate) -> Result<Option<FaqRecord>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let locked = sqlx::query("SELECT id FROM faqs WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to lock FAQ")?;

        if locked.is_none() {
            return Ok(None);
        }

        sqlx::query(
            "UPDATE faqs SET
                question = COALESCE($2, question),
                answer = COALESCE($3, answer),
                is_active = COALESCE($4, is_active),
                updated_at = $5
             WHERE id = $1",
        )
        .bind(id.0)
        .bind(changes.question.as_deref())
        .bind(changes.answer.as_deref())
        .bind(changes.is_active)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .context("Failed to update FAQ")?;

        for (lang, translation) in &changes.translations {
            upsert_translation(&mut tx, id, lang, translation).await?;
        }

        let record = fetch_record(&mut tx, id).await?;
        tx.commit().await.context("Failed to commit FAQ update")?;
        Ok(record)
    }

    async fn get_by_id(&self, id: FaqId) -> Result<Option<FaqRecord>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire database connection")?;
        fetch_record(&mut conn, id).await
    }

    async fn list_active(&self) -> Result<Vec<FaqRecord>> {
        self.list_where(true).await
    }

    async fn list_all(&self) -> Result<Vec<FaqRecord>> {
        self.list_where(false).await
    }

    async fn delete(&self, id: FaqId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM faqs WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .context("Failed to delete FAQ")?;

        Ok(result.rows_affected() > 0)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

fn record_from_row(row: &PgRow) -> Result<FaqRecord> {
    Ok(FaqRecord {
        id: FaqId(row.try_get("id")?),
        question: row.try_get("question")?,
        answer: row.try_get("answer")?,
        translations: BTreeMap::new(),
        is_active: row.try_get("is_active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

async fn fetch_record(conn: &mut PgConnection, id: FaqId) -> Result<Option<FaqRecord>> {
    let sql = format!("SELECT {} FROM faqs WHERE id = $1", FAQ_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to load FAQ")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut records = vec![record_from_row(&row)?];
    attach_translations(conn, &mut records).await?;
    Ok(records.pop())
}

async fn attach_translations(conn: &mut PgConnection, records: &mut [FaqRecord]) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    let ids: Vec<i64> = records.iter().map(|record| record.id.0).collect();
    let rows = sqlx::query(
        "SELECT faq_id, lang, question, answer FROM faq_translations WHERE faq_id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to load FAQ translations")?;

    let mut by_record: HashMap<i64, BTreeMap<String, Translation>> = HashMap::new();
    for row in rows {
        let faq_id: i64 = row.try_get("faq_id")?;
        let lang: String = row.try_get("lang")?;
        let translation = Translation {
            question: row.try_get("question")?,
            answer: row.try_get("answer")?,
        };
        by_record.entry(faq_id).or_default().insert(lang, translation);
    }

    for record in records.iter_mut() {
        if let Some(translations) = by_record.remove(&record.id.0) {
            record.translations = translations;
        }
    }

    Ok(())
}

async fn upsert_translation(
    conn: &mut PgConnection,
    id: FaqId,
    lang: &str,
    translation: &Translation,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO faq_translations (faq_id, lang, question, answer)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (faq_id, lang) DO UPDATE SET
            question = COALESCE(EXCLUDED.question, faq_translations.question),
            answer = COALESCE(EXCLUDED.answer, faq_translations.answer)",
    )
    .bind(id.0)
    .bind(lang)
    .bind(translation.question.as_deref())
    .bind(translation.answer.as_deref())
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to store {} translation for FAQ {}", lang, id))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    //! These tests need a disposable PostgreSQL database. They are skipped
    //! unless `TEST_DATABASE_URL` is set.

    use super::*;
    use crate::i18n::Language;
    use crate::model::FaqField;
    use serial_test::serial;

    async fn test_store() -> Option<PgStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        Some(PgStore::connect(&url).await.expect("Failed to connect test database"))
    }

    #[tokio::test]
    #[serial]
    async fn test_pg_create_get_and_delete() {
        let Some(store) = test_store().await else {
            return;
        };

        let record = store
            .create(
                NewFaq::new("What is this service?", "<p>This is a test service.</p>")
                    .with_translation(
                        Language::HINDI,
                        Translation::new("यह सेवा क्या है?", "<p>यह एक परीक्षण सेवा है।</p>"),
                    ),
            )
            .await
            .expect("Should create");

        let loaded = store
            .get_by_id(record.id)
            .await
            .expect("Should load")
            .expect("Record should exist");
        assert_eq!(
            loaded.translated(FaqField::Question, "hi"),
            Some("यह सेवा क्या है?")
        );

        assert!(store.delete(record.id).await.expect("Should delete"));
        assert!(store.get_by_id(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[serial]
    async fn test_pg_update_merges_translation_fields() {
        let Some(store) = test_store().await else {
            return;
        };

        let record = store
            .create(NewFaq::new("Q?", "A").with_translation(
                Language::BENGALI,
                Translation::new("প্রশ্ন", "উত্তর"),
            ))
            .await
            .expect("Should create");

        let updated = store
            .update(
                record.id,
                &FaqUpdate::default().translation(
                    Language::BENGALI,
                    Translation {
                        question: Some("নতুন প্রশ্ন".to_string()),
                        answer: None,
                    },
                ),
            )
            .await
            .expect("Should update")
            .expect("Record should exist");

        assert_eq!(updated.translated(FaqField::Question, "bn"), Some("নতুন প্রশ্ন"));
        assert_eq!(updated.translated(FaqField::Answer, "bn"), Some("উত্তর"));

        store.delete(record.id).await.expect("Should delete");
    }

    #[tokio::test]
    #[serial]
    async fn test_pg_list_active_excludes_inactive() {
        let Some(store) = test_store().await else {
            return;
        };

        let visible = store.create(NewFaq::new("Visible?", "A")).await.unwrap();
        let hidden = store
            .create(NewFaq::new("Hidden?", "A").inactive())
            .await
            .unwrap();

        let active = store.list_active().await.unwrap();
        assert!(active.iter().any(|r| r.id == visible.id));
        assert!(!active.iter().any(|r| r.id == hidden.id));

        store.delete(visible.id).await.unwrap();
        store.delete(hidden.id).await.unwrap();
    }
}
