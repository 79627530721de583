//! HTTP routes for the roots and translations collections.

mod health;
mod roots;
mod translations;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::error::ApiError;
use crate::models::{Root, Translation};
use crate::repository::Repository;
use crate::store::DocumentStore;

/// Shared by every handler; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub roots: Repository<Root>,
    pub translations: Repository<Translation>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            roots: Repository::new(Arc::clone(&store)),
            translations: Repository::new(store),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

impl SearchParams {
    /// The query text; missing or empty is rejected.
    fn query(self) -> Result<String, ApiError> {
        match self.q {
            Some(q) if !q.is_empty() => Ok(q),
            _ => Err(ApiError::InvalidQuery(
                "query parameter 'q' must not be empty".to_string(),
            )),
        }
    }
}

/// Build the router with every route and the shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::health))
        .route("/roots", get(roots::list_roots).post(roots::create_root))
        .route("/roots/search", get(roots::search_roots))
        .route(
            "/roots/:id",
            get(roots::get_root)
                .put(roots::update_root)
                .delete(roots::delete_root),
        )
        .route(
            "/translations",
            get(translations::list_translations).post(translations::create_translation),
        )
        .route(
            "/translations/search",
            get(translations::search_translations),
        )
        .route(
            "/translations/by-root/:root",
            get(translations::list_translations_by_root),
        )
        .route(
            "/translations/:id",
            get(translations::get_translation)
                .put(translations::update_translation)
                .delete(translations::delete_translation),
        )
        .with_state(state)
}

/// CORS for the configured front-end origins, with credentials. A `*`
/// among them admits any origin by echoing it back.
pub fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins.iter().cloned())
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
