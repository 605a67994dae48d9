use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{
    domain::{EntityName, RecordId},
    record::{Fields, StoredRecord},
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};

use crate::{ensure_sqlite_parent_dir_exists, RecordStore};

/// Records kept as JSON text in a SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        let store = Self { pool };
        store.ensure_tables().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn ensure_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entity_sequences (
                entity  TEXT PRIMARY KEY,
                next_id INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure entity_sequences table exists")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entity_records (
                entity TEXT NOT NULL,
                id     INTEGER NOT NULL,
                body   TEXT NOT NULL,
                PRIMARY KEY (entity, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure entity_records table exists")?;

        Ok(())
    }
}

fn decode_body(id: i64, body: &str) -> Result<StoredRecord> {
    let fields: Fields = serde_json::from_str(body)
        .with_context(|| format!("record {id} holds a malformed JSON body"))?;
    Ok(StoredRecord {
        id: RecordId(id),
        fields,
    })
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert(&self, entity: &EntityName, fields: Fields) -> Result<StoredRecord> {
        let body = serde_json::to_string(&fields)?;
        let mut tx = self.pool.begin().await?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO entity_sequences (entity, next_id) VALUES (?, 2)
             ON CONFLICT(entity) DO UPDATE SET next_id = next_id + 1
             RETURNING next_id - 1",
        )
        .bind(entity.as_str())
        .fetch_one(&mut *tx)
        .await
        .context("failed to allocate record id")?;
        sqlx::query("INSERT INTO entity_records (entity, id, body) VALUES (?, ?, ?)")
            .bind(entity.as_str())
            .bind(id)
            .bind(body)
            .execute(&mut *tx)
            .await
            .context("failed to insert record")?;
        tx.commit().await?;
        Ok(StoredRecord {
            id: RecordId(id),
            fields,
        })
    }

    async fn find(&self, entity: &EntityName, id: RecordId) -> Result<Option<StoredRecord>> {
        let row = sqlx::query("SELECT body FROM entity_records WHERE entity = ? AND id = ?")
            .bind(entity.as_str())
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| decode_body(id.0, &r.get::<String, _>(0)))
            .transpose()
    }

    async fn list(&self, entity: &EntityName) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query("SELECT id, body FROM entity_records WHERE entity = ? ORDER BY id")
            .bind(entity.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|r| decode_body(r.get::<i64, _>(0), &r.get::<String, _>(1)))
            .collect()
    }

    async fn replace(&self, entity: &EntityName, record: &StoredRecord) -> Result<bool> {
        let body = serde_json::to_string(&record.fields)?;
        let result = sqlx::query("UPDATE entity_records SET body = ? WHERE entity = ? AND id = ?")
            .bind(body)
            .bind(entity.as_str())
            .bind(record.id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, entity: &EntityName, id: RecordId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entity_records WHERE entity = ? AND id = ?")
            .bind(entity.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, entity: &EntityName) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entity_records WHERE entity = ?")
            .bind(entity.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}
