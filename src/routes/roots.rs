use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::{AppState, SearchParams};
use crate::error::ApiError;
use crate::models::{Root, RootDocument, RootPatch};
use crate::repository::Stored;
use crate::store::DocumentId;

const NOT_FOUND: ApiError = ApiError::NotFound("Root");

pub async fn list_roots(State(state): State<AppState>) -> Result<Json<Vec<Stored<Root>>>, ApiError> {
    Ok(Json(state.roots.list().await?))
}

pub async fn search_roots(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Stored<Root>>>, ApiError> {
    let Query(params) = params?;
    let query = params.query()?;
    Ok(Json(state.roots.search(&query).await?))
}

pub async fn get_root(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Stored<Root>>, ApiError> {
    state
        .roots
        .get_by_id(&DocumentId::from(id))
        .await?
        .map(Json)
        .ok_or(NOT_FOUND)
}

pub async fn create_root(
    State(state): State<AppState>,
    payload: Result<Json<RootDocument>, JsonRejection>,
) -> Result<(StatusCode, Json<Stored<Root>>), ApiError> {
    let Json(doc) = payload?;
    let root = Root::try_from(doc)?;
    let stored = state.roots.insert(root).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update_root(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RootPatch>, JsonRejection>,
) -> Result<Json<Stored<Root>>, ApiError> {
    let Json(patch) = payload?;
    state
        .roots
        .update_partial(&DocumentId::from(id), patch)
        .await?
        .map(Json)
        .ok_or(NOT_FOUND)
}

pub async fn delete_root(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.roots.delete(&DocumentId::from(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(NOT_FOUND)
    }
}
