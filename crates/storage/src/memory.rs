use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{EntityName, RecordId},
    record::{Fields, StoredRecord},
};
use tokio::sync::RwLock;

use crate::RecordStore;

struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Fields>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

/// Process-local store; contents are lost on shutdown.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, entity: &EntityName, fields: Fields) -> Result<StoredRecord> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(entity.as_str().to_string()).or_default();
        let id = table.next_id;
        table.next_id += 1;
        table.rows.insert(id, fields.clone());
        Ok(StoredRecord {
            id: RecordId(id),
            fields,
        })
    }

    async fn find(&self, entity: &EntityName, id: RecordId) -> Result<Option<StoredRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(entity.as_str())
            .and_then(|table| table.rows.get(&id.0))
            .map(|fields| StoredRecord {
                id,
                fields: fields.clone(),
            }))
    }

    async fn list(&self, entity: &EntityName) -> Result<Vec<StoredRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(entity.as_str())
            .map(|table| {
                table
                    .rows
                    .iter()
                    .map(|(id, fields)| StoredRecord {
                        id: RecordId(*id),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn replace(&self, entity: &EntityName, record: &StoredRecord) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(slot) = tables
            .get_mut(entity.as_str())
            .and_then(|table| table.rows.get_mut(&record.id.0))
        else {
            return Ok(false);
        };
        *slot = record.fields.clone();
        Ok(true)
    }

    async fn delete(&self, entity: &EntityName, id: RecordId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .get_mut(entity.as_str())
            .and_then(|table| table.rows.remove(&id.0))
            .is_some())
    }

    async fn count(&self, entity: &EntityName) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(entity.as_str())
            .map_or(0, |table| table.rows.len()))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
