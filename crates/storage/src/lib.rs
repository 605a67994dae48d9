use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{
    domain::{EntityName, RecordId},
    record::{Fields, StoredRecord},
};
use tracing::info;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Value of `database_url` that selects the in-process store.
pub const MEMORY_URL: &str = "memory";

/// Record persistence, partitioned by entity.
///
/// Ids are allocated per entity starting at 1 and are never handed out twice,
/// even after the record holding them is deleted.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, entity: &EntityName, fields: Fields) -> Result<StoredRecord>;

    async fn find(&self, entity: &EntityName, id: RecordId) -> Result<Option<StoredRecord>>;

    /// All records of `entity` in ascending id order.
    async fn list(&self, entity: &EntityName) -> Result<Vec<StoredRecord>>;

    /// Overwrites an existing record. Returns `false` if it does not exist.
    async fn replace(&self, entity: &EntityName, record: &StoredRecord) -> Result<bool>;

    async fn delete(&self, entity: &EntityName, id: RecordId) -> Result<bool>;

    async fn count(&self, entity: &EntityName) -> Result<usize>;

    async fn health_check(&self) -> Result<()>;
}

/// Opens the store selected by `database_url`: absent or `memory` keeps
/// records in process, anything else is treated as a SQLite location.
pub async fn open_store(database_url: Option<&str>) -> Result<Arc<dyn RecordStore>> {
    match database_url.map(str::trim) {
        None | Some("") | Some(MEMORY_URL) => {
            info!("using in-memory record store");
            Ok(Arc::new(MemoryStore::new()))
        }
        Some(raw) => {
            let database_url = prepare_database_url(raw)?;
            info!(%database_url, "using sqlite record store");
            Ok(Arc::new(SqliteStore::new(&database_url).await?))
        }
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
