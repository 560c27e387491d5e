use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use user_facade::infrastructure::memory::MemoryDocumentStore;
use user_facade::infrastructure::store::{
    Document, DocumentQuery, DocumentStore, Page, PatchOperation, StoreError,
};
use user_facade::{router, AppState, DocumentUserService};

fn app() -> Router {
    app_with_page_size(100)
}

fn app_with_page_size(page_size: usize) -> Router {
    let store = Arc::new(MemoryDocumentStore::new());
    let users = DocumentUserService::new(store).with_page_size(page_size);
    router(AppState::new(Arc::new(users)))
}

/// 每次调用都返回存储故障
struct ThrottledStore;

#[async_trait]
impl DocumentStore for ThrottledStore {
    async fn create(&self, _id: &str, _document: Document) -> Result<Document, StoreError> {
        Err(StoreError::Fault("throttled".to_string()))
    }

    async fn read(&self, _id: &str) -> Result<Document, StoreError> {
        Err(StoreError::Fault("throttled".to_string()))
    }

    async fn patch(
        &self,
        _id: &str,
        _operations: &[PatchOperation],
    ) -> Result<Document, StoreError> {
        Err(StoreError::Fault("throttled".to_string()))
    }

    async fn delete(&self, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Fault("throttled".to_string()))
    }

    async fn query(
        &self,
        _query: &DocumentQuery,
        _continuation: Option<&str>,
    ) -> Result<Page, StoreError> {
        Err(StoreError::Fault("throttled".to_string()))
    }
}

fn throttled_app() -> Router {
    let users = DocumentUserService::new(Arc::new(ThrottledStore));
    router(AppState::new(Arc::new(users)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_create_fetch_delete_flow() {
    let app = app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/user",
        Some(json!({ "userId": "u1", "name": "Ann", "email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["success"], true);

    let id = created["result"]["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(
        created["result"],
        json!({
            "id": id,
            "userId": "u1",
            "name": "Ann",
            "email": "a@x.com",
            "apiKeys": null
        })
    );

    let (status, fetched) = send(&app, Method::GET, &format!("/user/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["result"], created["result"]);

    let (status, deleted) = send(&app, Method::DELETE, &format!("/user/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);
    assert!(deleted["result"].is_null());

    let (status, missing) = send(&app, Method::GET, &format!("/user/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["success"], false);
    assert!(missing["result"].is_null());
}

#[tokio::test]
async fn test_round_trip_preserves_api_keys() {
    let app = app();
    let body = json!({
        "id": "user-42",
        "userId": "u1",
        "name": "Ann",
        "email": "a@x.com",
        "apiKeys": [
            { "key": "k1", "createdAt": "2024-05-01T10:00:00Z", "expiresAt": null },
            { "key": "k2", "createdAt": "2024-05-02T10:00:00Z", "expiresAt": "2025-05-02T10:00:00Z" }
        ]
    });

    let (status, _) = send(&app, Method::POST, "/user", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (_, fetched) = send(&app, Method::GET, "/user/user-42", None).await;
    let keys = fetched["result"]["apiKeys"].as_array().unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0]["key"], "k1");
    assert_eq!(keys[0]["createdAt"], "2024-05-01T10:00:00Z");
    assert!(keys[0]["expiresAt"].is_null());
    assert_eq!(keys[1]["expiresAt"], "2025-05-02T10:00:00Z");
}

#[tokio::test]
async fn test_duplicate_id_is_bad_request() {
    let app = app();
    let body = json!({ "id": "same", "userId": "u1", "name": "Ann", "email": "a@x.com" });

    let (status, _) = send(&app, Method::POST, "/user", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, again) = send(&app, Method::POST, "/user", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(again["success"], false);
    assert!(again["result"].is_null());
}

#[tokio::test]
async fn test_blank_name_is_bad_request() {
    let app = app();

    let (status, response) = send(
        &app,
        Method::POST,
        "/user",
        Some(json!({ "userId": "u1", "name": "  ", "email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["success"], false);

    let (_, listed) = send(&app, Method::GET, "/users", None).await;
    assert_eq!(listed["result"], json!([]));
}

#[tokio::test]
async fn test_malformed_body_returns_envelope() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/user")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["result"].is_null());

    // 缺少必填字段同样是 400
    let (status, _) = send(&app, Method::POST, "/user", Some(json!({ "name": "Ann" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_empty_store() {
    let (status, listed) = send(&app(), Method::GET, "/users", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["success"], true);
    assert_eq!(listed["result"], json!([]));
}

#[tokio::test]
async fn test_list_spans_pages_and_filters() {
    let app = app_with_page_size(2);
    for (id, user_id) in [("a", "u1"), ("b", "u2"), ("c", "u1"), ("d", "u1"), ("e", "u2")] {
        let body = json!({ "id": id, "userId": user_id, "name": "N", "email": format!("{}@x.com", id) });
        send(&app, Method::POST, "/user", Some(body)).await;
    }

    let (_, all) = send(&app, Method::GET, "/users", None).await;
    let ids: Vec<_> = all["result"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);

    let (status, filtered) = send(&app, Method::GET, "/users?userId=u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered["result"].as_array().unwrap().len(), 3);

    let (_, by_email) = send(&app, Method::GET, "/users?email=e@x.com", None).await;
    assert_eq!(by_email["result"][0]["id"], "e");
}

#[tokio::test]
async fn test_partial_update() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/user",
        Some(json!({
            "id": "p1",
            "userId": "u1",
            "name": "Ann",
            "email": "a@x.com",
            "apiKeys": [{ "key": "k1", "createdAt": "2024-05-01T10:00:00Z", "expiresAt": null }]
        })),
    )
    .await;

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/user/p1",
        Some(json!({ "name": "Bea", "email": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["success"], true);
    assert_eq!(updated["result"]["name"], "Bea");
    assert_eq!(updated["result"]["email"], "a@x.com");
    assert_eq!(updated["result"]["apiKeys"][0]["key"], "k1");

    let (_, fetched) = send(&app, Method::GET, "/user/p1", None).await;
    assert_eq!(fetched["result"], updated["result"]);
}

#[tokio::test]
async fn test_update_and_delete_missing_are_bad_request() {
    let app = app();

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/user/ghost",
        Some(json!({ "name": "Bea", "email": "b@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(updated["success"], false);
    assert!(updated["result"].is_null());

    let (status, deleted) = send(&app, Method::DELETE, "/user/ghost", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(deleted["success"], false);
}

#[tokio::test]
async fn test_delete_twice() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/user",
        Some(json!({ "id": "d1", "userId": "u1", "name": "Ann", "email": "a@x.com" })),
    )
    .await;

    let (first, _) = send(&app, Method::DELETE, "/user/d1", None).await;
    let (second, body) = send(&app, Method::DELETE, "/user/d1", None).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_root_redirects_to_docs() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[header::LOCATION], "/swagger-ui");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (status, doc) = send(&app(), Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/user/{id}"].is_object());
}

#[tokio::test]
async fn test_supplied_id_is_stored_verbatim() {
    let app = app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/user",
        Some(json!({ "id": " x1 ", "userId": "u1", "name": "Ann", "email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["result"]["id"], " x1 ");

    let (status, fetched) = send(&app, Method::GET, "/user/%20x1%20", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["result"]["id"], " x1 ");

    let (status, _) = send(&app, Method::GET, "/user/x1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_undecodable_path_returns_envelope() {
    let app = app();

    for method in [Method::GET, Method::DELETE] {
        let (status, body) = send(&app, method, "/user/%FF", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
        assert!(body["result"].is_null());
    }

    let (status, body) = send(
        &app,
        Method::PUT,
        "/user/%FF",
        Some(json!({ "name": "Bob", "email": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_store_fault_on_list_is_server_error() {
    let app = throttled_app();

    let (status, body) = send(&app, Method::GET, "/users", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "document store fault: throttled");
    assert!(body["result"].is_null());
}

#[tokio::test]
async fn test_store_fault_on_fetch_is_not_found() {
    let app = throttled_app();

    let (status, body) = send(&app, Method::GET, "/user/x", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "document store fault: throttled");
    assert!(body["result"].is_null());

    let (status, body) = send(&app, Method::DELETE, "/user/x", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "document store fault: throttled");
}
