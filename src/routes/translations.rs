use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::{AppState, SearchParams};
use crate::error::ApiError;
use crate::models::{Translation, TranslationDocument, TranslationPatch};
use crate::repository::Stored;
use crate::store::DocumentId;

const NOT_FOUND: ApiError = ApiError::NotFound("Translation");

type Translations = Json<Vec<Stored<Translation>>>;

pub async fn list_translations(State(state): State<AppState>) -> Result<Translations, ApiError> {
    Ok(Json(state.translations.list().await?))
}

pub async fn search_translations(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Translations, ApiError> {
    let Query(params) = params?;
    let query = params.query()?;
    Ok(Json(state.translations.search(&query).await?))
}

pub async fn list_translations_by_root(
    State(state): State<AppState>,
    Path(root): Path<String>,
) -> Result<Translations, ApiError> {
    Ok(Json(state.translations.list_by_root(&root).await?))
}

pub async fn get_translation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Stored<Translation>>, ApiError> {
    state
        .translations
        .get_by_id(&DocumentId::from(id))
        .await?
        .map(Json)
        .ok_or(NOT_FOUND)
}

pub async fn create_translation(
    State(state): State<AppState>,
    payload: Result<Json<TranslationDocument>, JsonRejection>,
) -> Result<(StatusCode, Json<Stored<Translation>>), ApiError> {
    let Json(doc) = payload?;
    let translation = Translation::try_from(doc)?;
    let stored = state.translations.insert(translation).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update_translation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TranslationPatch>, JsonRejection>,
) -> Result<Json<Stored<Translation>>, ApiError> {
    let Json(patch) = payload?;
    state
        .translations
        .update_partial(&DocumentId::from(id), patch)
        .await?
        .map(Json)
        .ok_or(NOT_FOUND)
}

pub async fn delete_translation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.translations.delete(&DocumentId::from(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(NOT_FOUND)
    }
}
