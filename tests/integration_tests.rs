//! Integration tests for the Kelma API
//!
//! These tests drive the full router in-process against the in-memory
//! document store, covering the HTTP contract of both verticals.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use kelma_api::repository::COLLECTIONS;
use kelma_api::routes::{build_router, AppState};
use kelma_api::store::MemoryStore;

// ==================== Test Helpers ====================

fn create_test_app() -> Router {
    build_router(AppState::new(Arc::new(MemoryStore::new(COLLECTIONS))))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

fn kira_noun() -> Value {
    json!({
        "kelma": "kira",
        "english": "book",
        "root": "k-t-b",
        "cat": "noun",
        "noun_type": "primary",
        "noun_fields": {
            "abs_plural": "kutub",
            "erg_plural": "kutubin",
            "gen_plural": "kutuben",
            "dat_plural": "kutubal",
            "par": "kutuba"
        }
    })
}

fn katab_root() -> Value {
    json!({
        "root": "k-t-b",
        "prim": "write",
        "mode": {
            "base": {"act_agt": "katib", "act_pat": ""},
            "long": {"pas_pat": "maktub"}
        }
    })
}

// ==================== Status Endpoint Tests ====================

#[tokio::test]
async fn test_banner_and_health() {
    let app = create_test_app();

    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Kelma API");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

// ==================== Root Endpoint Tests ====================

#[tokio::test]
async fn test_root_lifecycle() {
    let app = create_test_app();

    let (status, created) = send(&app, "POST", "/roots", Some(katab_root())).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["_id"].as_str().expect("assigned id").to_string();
    assert_eq!(
        created["mode"]["base"],
        json!({"act_agt": "katib"}),
        "empty strings are dropped"
    );

    let (status, fetched) = send(&app, "GET", &format!("/roots/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/roots/{}", id),
        Some(json!({"prim": "inscribe", "root": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["prim"], "inscribe");
    assert_eq!(updated["root"], "k-t-b");

    let (status, body) = send(&app, "DELETE", &format!("/roots/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, "DELETE", &format!("/roots/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Root not found");
}

#[tokio::test]
async fn test_root_with_empty_base_is_rejected() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/roots",
        Some(json!({"root": "x", "mode": {"base": {"act_agt": ""}}})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["detail"],
        "mode.base must have at least one non-empty field"
    );
}

#[tokio::test]
async fn test_root_with_supplied_empty_strong_is_rejected() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/roots",
        Some(json!({"root": "x", "mode": {"base": {"prim": "p"}, "strong": {}}})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["detail"],
        "mode.strong must have at least one non-empty field"
    );
}

#[tokio::test]
async fn test_root_search() {
    let app = create_test_app();
    for root in ["Foobar", "baz"] {
        let body = json!({"root": root, "mode": {"base": {"prim": "p"}}});
        let (status, _) = send(&app, "POST", "/roots", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, found) = send(&app, "GET", "/roots/search?q=foo", None).await;
    assert_eq!(status, StatusCode::OK);
    let found = found.as_array().expect("array");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["root"], "Foobar");

    let (status, all) = send(&app, "GET", "/roots", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().expect("array").len(), 2);
}

#[tokio::test]
async fn test_search_requires_query() {
    let app = create_test_app();

    let (status, _) = send(&app, "GET", "/roots/search", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, "GET", "/translations/search?q=", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_id_is_not_found() {
    let app = create_test_app();

    let (status, body) = send(&app, "GET", "/roots/not-an-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Root not found");

    let (status, _) = send(
        &app,
        "PUT",
        "/translations/64b7f0c2e1d3a9b8c7d6e5f4",
        Some(json!({"english": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ==================== Translation Endpoint Tests ====================

#[tokio::test]
async fn test_create_noun_echoes_fields() {
    let app = create_test_app();

    let (status, created) = send(&app, "POST", "/translations", Some(kira_noun())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(created["_id"].is_string());
    let mut expected = kira_noun();
    expected["_id"] = created["_id"].clone();
    expected["swadesh"] = json!(false);
    assert_eq!(created, expected);
}

#[tokio::test]
async fn test_verb_with_noun_payload_is_rejected() {
    let app = create_test_app();
    let mut body = kira_noun();
    body["cat"] = json!("verb");

    let (status, body) = send(&app, "POST", "/translations", Some(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let detail = body["detail"].as_str().expect("detail");
    assert!(detail.contains("verb_fields are required when category is 'verb'"));
    assert!(detail.contains("noun_fields should only be set when category is 'noun'"));
}

#[tokio::test]
async fn test_malformed_body_reports_detail() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/translations",
        Some(json!({"kelma": "kira", "cat": "noun"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_translation_update_and_by_root() {
    let app = create_test_app();

    let (_, created) = send(&app, "POST", "/translations", Some(kira_noun())).await;
    let id = created["_id"].as_str().expect("assigned id").to_string();
    let (_, _) = send(
        &app,
        "POST",
        "/translations",
        Some(json!({"kelma": "ana", "english": "I", "root": "a-n", "cat": "pronoun", "swadesh": true})),
    )
    .await;

    // Empty patch returns the entry unchanged
    let (status, same) = send(&app, "PUT", &format!("/translations/{}", id), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(same, created);

    // Switching category needs the new payload
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/translations/{}", id),
        Some(json!({"cat": "adjective", "noun_type": "radical"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/translations/{}", id),
        Some(json!({"cat": "adjective", "english": "bookish"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["cat"], "adjective");
    assert_eq!(updated["english"], "bookish");
    assert!(updated.get("noun_fields").is_none());

    let (status, by_root) = send(&app, "GET", "/translations/by-root/k-t-b", None).await;
    assert_eq!(status, StatusCode::OK);
    let by_root = by_root.as_array().expect("array");
    assert_eq!(by_root.len(), 1);
    assert_eq!(by_root[0]["_id"], id.as_str());

    let (status, found) = send(&app, "GET", "/translations/search?q=ANA", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().expect("array").len(), 1);
    assert_eq!(found[0]["swadesh"], true);
}

#[tokio::test]
async fn test_translation_delete_then_get() {
    let app = create_test_app();

    let (_, created) = send(&app, "POST", "/translations", Some(kira_noun())).await;
    let uri = format!("/translations/{}", created["_id"].as_str().expect("assigned id"));

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Translation not found");
}
