use std::sync::Arc;

use serde_json::Value;
use shared::{
    domain::{EntitySchema, RecordId},
    error::{ApiError, ErrorCode},
    protocol::DeleteResponse,
    record::{apply_input, blank_fields, render, Fields, StoredRecord},
};
use storage::RecordStore;
use tracing::{debug, error, info};

mod registry;

pub use registry::{EntityRegistry, RegistryError};

#[derive(Clone)]
pub struct ApiContext {
    pub registry: Arc<EntityRegistry>,
    pub store: Arc<dyn RecordStore>,
}

impl ApiContext {
    pub fn new(registry: EntityRegistry, store: Arc<dyn RecordStore>) -> Self {
        Self {
            registry: Arc::new(registry),
            store,
        }
    }
}

pub fn list_entities(ctx: &ApiContext) -> Vec<String> {
    ctx.registry.names()
}

pub async fn list_records(ctx: &ApiContext, entity: &str) -> Result<Vec<Fields>, ApiError> {
    let schema = schema_for(ctx, entity)?;
    let records = ctx.store.list(schema.name()).await.map_err(internal)?;
    Ok(records
        .iter()
        .map(|record| render(schema, record))
        .collect())
}

pub async fn get_record(ctx: &ApiContext, entity: &str, raw_id: &str) -> Result<Fields, ApiError> {
    let schema = schema_for(ctx, entity)?;
    let id = parse_record_id(raw_id)?;
    let record = load_record(ctx, schema, id).await?;
    Ok(render(schema, &record))
}

pub async fn create_record(ctx: &ApiContext, entity: &str, body: &[u8]) -> Result<Fields, ApiError> {
    let schema = schema_for(ctx, entity)?;
    let input = parse_body(body)?;
    let mut fields = blank_fields(schema);
    let rejected = apply_input(schema, &mut fields, &input);
    if !rejected.is_empty() {
        debug!(%entity, ?rejected, "ignored field values that do not match the schema");
    }
    let record = ctx
        .store
        .insert(schema.name(), fields)
        .await
        .map_err(internal)?;
    info!(%entity, id = record.id.0, "record created");
    Ok(render(schema, &record))
}

/// Partial update: fields absent from `body` keep their stored values.
pub async fn update_record(
    ctx: &ApiContext,
    entity: &str,
    raw_id: &str,
    body: &[u8],
) -> Result<Fields, ApiError> {
    let schema = schema_for(ctx, entity)?;
    let id = parse_record_id(raw_id)?;
    let input = parse_body(body)?;
    let mut record = load_record(ctx, schema, id).await?;
    let rejected = apply_input(schema, &mut record.fields, &input);
    if !rejected.is_empty() {
        debug!(%entity, id = id.0, ?rejected, "ignored field values that do not match the schema");
    }
    let replaced = ctx
        .store
        .replace(schema.name(), &record)
        .await
        .map_err(internal)?;
    if !replaced {
        return Err(not_found(schema));
    }
    info!(%entity, id = id.0, "record updated");
    Ok(render(schema, &record))
}

pub async fn delete_record(
    ctx: &ApiContext,
    entity: &str,
    raw_id: &str,
) -> Result<DeleteResponse, ApiError> {
    let schema = schema_for(ctx, entity)?;
    let id = parse_record_id(raw_id)?;
    let deleted = ctx
        .store
        .delete(schema.name(), id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(not_found(schema));
    }
    info!(%entity, id = id.0, "record deleted");
    Ok(DeleteResponse::for_entity(schema.name()))
}

/// Inserts `seeds` when `entity` holds no records yet, so restarting against
/// a persistent store does not duplicate them. Returns how many were inserted.
pub async fn seed_records(
    ctx: &ApiContext,
    entity: &str,
    seeds: &[Fields],
) -> Result<usize, ApiError> {
    let schema = schema_for(ctx, entity)?;
    if seeds.is_empty() {
        return Ok(0);
    }
    let existing = ctx.store.count(schema.name()).await.map_err(internal)?;
    if existing > 0 {
        debug!(%entity, existing, "store already populated; skipping seed records");
        return Ok(0);
    }
    for seed in seeds {
        let mut fields = blank_fields(schema);
        apply_input(schema, &mut fields, seed);
        ctx.store
            .insert(schema.name(), fields)
            .await
            .map_err(internal)?;
    }
    Ok(seeds.len())
}

pub fn parse_record_id(raw_id: &str) -> Result<RecordId, ApiError> {
    raw_id
        .trim()
        .parse::<i64>()
        .map(RecordId)
        .map_err(|_| ApiError::validation("Invalid ID format"))
}

fn parse_body(body: &[u8]) -> Result<Fields, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Fields::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ApiError::validation("request body must be a JSON object")),
        Err(e) => Err(ApiError::validation(format!("malformed JSON body: {e}"))),
    }
}

fn schema_for<'a>(ctx: &'a ApiContext, entity: &str) -> Result<&'a EntitySchema, ApiError> {
    ctx.registry
        .get(entity)
        .ok_or_else(|| ApiError::not_found(format!("Unknown entity '{entity}'")))
}

async fn load_record(
    ctx: &ApiContext,
    schema: &EntitySchema,
    id: RecordId,
) -> Result<StoredRecord, ApiError> {
    ctx.store
        .find(schema.name(), id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(schema))
}

fn not_found(schema: &EntitySchema) -> ApiError {
    ApiError::not_found(format!("{} not found", schema.name().display_name()))
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "record store failure");
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
