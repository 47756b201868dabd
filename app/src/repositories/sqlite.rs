//! SQLite document store
//!
//! Documents are kept as JSON text in a single `documents` table. The body
//! never carries `created_at`; that comes from its own column so the store
//! alone decides creation order.

use super::{Collection, Document, StoreError, StoreResult, UserScope, WorkoutStore};
use appfitness_shared::{ProgressEntry, WorkoutRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

/// Row shape shared by both collections
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    body: String,
    created_at: i64,
}

impl DocumentRow {
    fn into_document<D: Document>(self) -> StoreResult<D> {
        let mut doc: D = serde_json::from_str(&self.body)?;
        doc.set_created_at(DateTime::from_timestamp_millis(self.created_at));
        Ok(doc)
    }
}

/// Store backed by a local SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn list<D: Document>(&self, scope: &UserScope) -> StoreResult<Vec<D>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT body, created_at
            FROM documents
            WHERE collection = ? AND user_id = ?
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .bind(D::COLLECTION.as_str())
        .bind(&scope.user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DocumentRow::into_document).collect()
    }

    async fn insert<D: Document>(&self, scope: &UserScope, doc: &D) -> StoreResult<D> {
        let created_at = Utc::now();
        let mut body_doc = doc.clone();
        body_doc.set_created_at(None);
        let body = serde_json::to_string(&body_doc)?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, user_id, id, created_at, body)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(D::COLLECTION.as_str())
        .bind(&scope.user_id)
        .bind(doc.id())
        .bind(created_at.timestamp_millis())
        .bind(&body)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::AlreadyExists(format!("{}/{}", D::COLLECTION, doc.id()))
            }
            other => StoreError::Database(other),
        })?;

        debug!(collection = %D::COLLECTION, id = doc.id(), "Document stored");

        let mut stored = body_doc;
        stored.set_created_at(DateTime::from_timestamp_millis(created_at.timestamp_millis()));
        Ok(stored)
    }

    async fn delete(&self, collection: Collection, scope: &UserScope, id: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM documents WHERE collection = ? AND user_id = ? AND id = ?",
        )
        .bind(collection.as_str())
        .bind(&scope.user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl WorkoutStore for SqliteStore {
    async fn list_workouts(&self, scope: &UserScope) -> StoreResult<Vec<WorkoutRecord>> {
        self.list(scope).await
    }

    async fn add_workout(
        &self,
        scope: &UserScope,
        record: &WorkoutRecord,
    ) -> StoreResult<WorkoutRecord> {
        self.insert(scope, record).await
    }

    async fn delete_workout(&self, scope: &UserScope, id: &str) -> StoreResult<bool> {
        self.delete(Collection::Workouts, scope, id).await
    }

    async fn list_progress(&self, scope: &UserScope) -> StoreResult<Vec<ProgressEntry>> {
        self.list(scope).await
    }

    async fn add_progress(
        &self,
        scope: &UserScope,
        entry: &ProgressEntry,
    ) -> StoreResult<ProgressEntry> {
        self.insert(scope, entry).await
    }

    async fn delete_progress(&self, scope: &UserScope, id: &str) -> StoreResult<bool> {
        self.delete(Collection::Progress, scope, id).await
    }

    async fn update_progress_photos(
        &self,
        scope: &UserScope,
        id: &str,
        photos: &[String],
    ) -> StoreResult<ProgressEntry> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT body, created_at FROM documents WHERE collection = ? AND user_id = ? AND id = ?",
        )
        .bind(Collection::Progress.as_str())
        .bind(&scope.user_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("progress entry {}", id)))?;

        let mut entry: ProgressEntry = row.into_document()?;
        entry.photos = photos.to_vec();

        let mut body_doc = entry.clone();
        body_doc.created_at = None;
        sqlx::query("UPDATE documents SET body = ? WHERE collection = ? AND user_id = ? AND id = ?")
            .bind(serde_json::to_string(&body_doc)?)
            .bind(Collection::Progress.as_str())
            .bind(&scope.user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
