mod support;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use roster::application::repos::{HealthRepo, RepoError};
use roster::cache::{CacheConfig, MemoryStore};
use roster::infra::http::api::models::{DB_CONNECTED_MESSAGE, StudentResponse};
use roster::infra::http::{ApiState, REQUEST_ID_HEADER, build_router};

use support::{FlakyStore, Harness};

struct DownDatabase;

#[async_trait]
impl HealthRepo for DownDatabase {
    async fn health_check(&self) -> Result<(), RepoError> {
        Err(RepoError::Timeout)
    }
}

fn router_for<S: roster::cache::ExpiringStore + 'static>(harness: &Harness<S>) -> Router {
    build_router(ApiState {
        students: Arc::new(harness.service.clone()),
        db: harness.students.clone(),
    })
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("request should build");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn root_reports_database_connectivity() {
    let harness = Harness::new();
    let router = router_for(&harness);

    let (status, body) = send(&router, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], DB_CONNECTED_MESSAGE);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let harness = Harness::new();
    let router = router_for(&harness);

    let mut ids = Vec::new();
    for uri in ["/students", "/students/404"] {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build");
        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .expect("request id header");
        ids.push(id);
    }

    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn root_is_unavailable_when_database_check_fails() {
    let harness = Harness::new();
    let router = build_router(ApiState {
        students: Arc::new(harness.service.clone()),
        db: Arc::new(DownDatabase),
    });

    let (status, body) = send(&router, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "db_unavailable");
}

#[tokio::test]
async fn student_lifecycle_over_http() {
    let harness = Harness::new();
    let router = router_for(&harness);

    let (status, body) = send(
        &router,
        Method::POST,
        "/students",
        Some(json!({ "name": "Ada Lovelace", "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let created: StudentResponse = serde_json::from_value(body).expect("student json");
    assert_eq!(created.name, "Ada Lovelace");
    assert_eq!(created.email, "ada@example.com");

    let (status, body) = send(&router, Method::GET, &format!("/students/{}", created.id), None).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: StudentResponse = serde_json::from_value(body).expect("student json");
    assert_eq!(fetched, created);

    let (status, body) = send(&router, Method::GET, "/students", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<StudentResponse> = serde_json::from_value(body).expect("listing json");
    assert_eq!(listed, vec![created]);

    let (status, body) = send(&router, Method::DELETE, "/students/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);

    let (status, body) = send(&router, Method::GET, "/students/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, body) = send(&router, Method::DELETE, "/students/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn trailing_slash_routes_accept_list_and_create() {
    let harness = Harness::new();
    let router = router_for(&harness);

    let (status, _) = send(
        &router,
        Method::POST,
        "/students/",
        Some(json!({ "name": "Grace", "email": "grace@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, Method::GET, "/students/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn invalid_input_is_a_client_error() {
    let harness = Harness::new();
    let router = router_for(&harness);

    let (status, body) = send(
        &router,
        Method::POST,
        "/students",
        Some(json!({ "name": "   ", "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
    assert!(body["error"]["hint"].is_string());

    let (status, _) = send(
        &router,
        Method::POST,
        "/students",
        Some(json!({ "name": "Ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(harness.students.rows().is_empty());
}

#[tokio::test]
async fn non_numeric_id_is_rejected() {
    let harness = Harness::new();
    let router = router_for(&harness);

    let (status, _) = send(&router, Method::GET, "/students/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn strict_cache_failure_is_service_unavailable() {
    let cache = Arc::new(FlakyStore::new());
    let config = CacheConfig {
        strict: true,
        ..Default::default()
    };
    let harness = Harness::with_store(cache.clone(), config);
    let router = router_for(&harness);
    cache.failing.store(true, Ordering::SeqCst);

    let (status, body) = send(
        &router,
        Method::POST,
        "/students",
        Some(json!({ "name": "Ada", "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "cache_unavailable");
    assert_eq!(harness.students.rows().len(), 1);
}

#[tokio::test]
async fn best_effort_cache_failure_is_invisible_to_clients() {
    let cache = Arc::new(FlakyStore::new());
    let harness = Harness::with_store(cache.clone(), CacheConfig::default());
    let router = router_for(&harness);
    cache.failing.store(true, Ordering::SeqCst);

    let (status, _) = send(
        &router,
        Method::POST,
        "/students",
        Some(json!({ "name": "Ada", "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, Method::GET, "/students/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");
}

#[tokio::test]
async fn list_is_served_from_cache_after_first_request() {
    let harness = Harness::<MemoryStore>::new();
    let router = router_for(&harness);

    send(&router, Method::GET, "/students", None).await;
    send(&router, Method::GET, "/students", None).await;
    send(
        &router,
        Method::POST,
        "/students",
        Some(json!({ "name": "Ada", "email": "ada@example.com" })),
    )
    .await;
    let (_, body) = send(&router, Method::GET, "/students", None).await;

    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(harness.students.lists.load(Ordering::SeqCst), 1);
    assert_eq!(harness.queue.notified(), vec![1]);
}
