use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Pool, Postgres};
use tracing::debug;

use super::models::{Document, DocumentRow};
use super::{apply_write, DocPath, DocumentStore, StoreError, WriteOp};

/// Document store backed by a single JSONB table
pub struct PgDocumentStore {
    pool: Pool<Postgres>,
}

impl PgDocumentStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        let data: Option<Value> = sqlx::query_scalar("SELECT data FROM documents WHERE path = $1")
            .bind(path.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(data)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT path, data
            FROM documents
            WHERE collection = $1
            ORDER BY path
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        debug!("Listed {} documents from {}", rows.len(), collection);
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn delete(&self, path: &DocPath) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE path = $1")
            .bind(path.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply every operation inside one transaction.
    ///
    /// Server timestamps come from the database clock, read once per commit.
    async fn commit(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }

        debug!("Committing batch of {} operations", ops.len());

        let mut tx = self.pool.begin().await?;
        let now: DateTime<Utc> = sqlx::query_scalar("SELECT NOW()")
            .fetch_one(&mut *tx)
            .await?;

        for op in ops {
            let existing: Option<Value> =
                sqlx::query_scalar("SELECT data FROM documents WHERE path = $1 FOR UPDATE")
                    .bind(op.path.as_str())
                    .fetch_optional(&mut *tx)
                    .await?;

            let doc = apply_write(existing, op, now);

            sqlx::query(
                r#"
                INSERT INTO documents (path, collection, data, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (path)
                DO UPDATE SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(op.path.as_str())
            .bind(op.path.collection())
            .bind(doc)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Batch of {} operations committed", ops.len());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
