use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use server_api::{
    create_record, delete_record, get_record, list_entities, list_records, update_record,
    ApiContext,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::DeleteResponse,
    record::Fields,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::warn;

use crate::admin;

pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub api: ApiContext,
}

type HttpError = (StatusCode, Json<ApiError>);

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(admin::index))
        .route("/app.js", get(admin::script))
        .route("/healthz", get(healthz))
        .route("/api/entities", get(http_list_entities))
        .route(
            "/api/:entity",
            get(http_list_records).post(http_create_record),
        )
        .route(
            "/api/:entity/:id",
            get(http_get_record)
                .put(http_update_record)
                .delete(http_delete_record),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn http_error(err: ApiError) -> HttpError {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.store.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            warn!(%error, "record store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_list_entities(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(list_entities(&state.api))
}

async fn http_list_records(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
) -> Result<Json<Vec<Fields>>, HttpError> {
    let records = list_records(&state.api, &entity)
        .await
        .map_err(http_error)?;
    Ok(Json(records))
}

async fn http_get_record(
    State(state): State<Arc<AppState>>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<Fields>, HttpError> {
    let record = get_record(&state.api, &entity, &id)
        .await
        .map_err(http_error)?;
    Ok(Json(record))
}

async fn http_create_record(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
    body: Bytes,
) -> Result<Json<Fields>, HttpError> {
    let record = create_record(&state.api, &entity, &body)
        .await
        .map_err(http_error)?;
    Ok(Json(record))
}

async fn http_update_record(
    State(state): State<Arc<AppState>>,
    Path((entity, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Fields>, HttpError> {
    let record = update_record(&state.api, &entity, &id, &body)
        .await
        .map_err(http_error)?;
    Ok(Json(record))
}

async fn http_delete_record(
    State(state): State<Arc<AppState>>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>, HttpError> {
    let response = delete_record(&state.api, &entity, &id)
        .await
        .map_err(http_error)?;
    Ok(Json(response))
}

#[cfg(test)]
#[path = "tests/routes_tests.rs"]
mod tests;
