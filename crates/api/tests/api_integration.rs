//! API integration tests.
//!
//! These drive the full router, including the auth middleware, against a
//! mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware::from_fn_with_state,
};
use chrono::Utc;
use owr_api::{AppState, auth_middleware, router as api_router};
use owr_common::config::{
    AdminSettings, Config, DatabaseConfig, EmailSettings, LogSettings, ServerConfig,
    StorageSettings, TranslationSettings,
};
use owr_core::{EmailService, Mailer};
use owr_db::entities::{
    category, candidate,
    user::{self, UserStatus},
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::Value;
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            url: "http://localhost:3000".to_string(),
            max_upload_bytes: 1024 * 1024,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "postgres://localhost/owr_test".to_string(),
            max_connections: 5,
            min_connections: 1,
        },
        storage: StorageSettings {
            base_path: std::env::temp_dir().join("owr-api-tests"),
            public_base_url: "http://localhost:3000/api/files".to_string(),
            signing_secret: "test-secret".to_string(),
            signed_url_ttl_secs: 60,
        },
        email: EmailSettings::default(),
        translation: TranslationSettings::default(),
        admin: AdminSettings::default(),
        log: LogSettings::default(),
    }
}

fn app(db: DatabaseConnection) -> Router {
    let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(&EmailSettings::default()).unwrap());
    let state = AppState::new(Arc::new(db), &test_config(), mailer).unwrap();

    Router::new()
        .nest("/api", api_router())
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
    maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
}

fn test_user() -> user::Model {
    user::Model {
        id: "user1".to_string(),
        email: "ada@example.com".to_string(),
        full_name: Some("Ada".to_string()),
        password_hash: "$argon2id$unused".to_string(),
        token: Some("tok".to_string()),
        status: UserStatus::Active,
        created_at: Utc::now(),
        updated_at: None,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_list_categories_wraps_data() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[category::Model {
            id: "cat1".to_string(),
            name: "Sports".to_string(),
            full_name: "Sports records".to_string(),
            description: None,
            image_url: None,
            display_order: 0,
            created_at: Utc::now(),
        }]])
        .into_connection();

    let response = app(db).oneshot(get("/api/categories")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["fullName"], "Sports records");
}

#[tokio::test]
async fn test_vote_requires_authentication() {
    let response = app(empty_db())
        .oneshot(post_json("/api/votes", None, r#"{"candidateId":"c1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_second_vote_is_conflict() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // token lookup
        .append_query_results([[test_user()]])
        // candidate
        .append_query_results([[candidate::Model {
            id: "c1".to_string(),
            subcategory_id: "s1".to_string(),
            name: "Ada".to_string(),
            description: None,
            display_order: 0,
            vote_count: 3,
            created_at: Utc::now(),
        }]])
        // existing vote in the subcategory
        .append_query_results([[count_row(1)]])
        .into_connection();

    let response = app(db)
        .oneshot(post_json("/api/votes", Some("tok"), r#"{"candidateId":"c1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "ALREADY_VOTED");
}

#[tokio::test]
async fn test_vote_status_reports_existing_vote() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_user()]])
        .append_query_results([[count_row(1)]])
        .into_connection();

    let request = Request::builder()
        .uri("/api/votes/status?subcategoryId=s1")
        .header(header::AUTHORIZATION, "Bearer tok")
        .body(Body::empty())
        .unwrap();
    let response = app(db).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["hasVoted"], true);
}

#[tokio::test]
async fn test_admin_route_refuses_anonymous() {
    let response = app(empty_db())
        .oneshot(post_json("/api/admin/categories", None, r#"{}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_route_refuses_non_admin() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_user()]])
        .append_query_results([[count_row(0)]])
        .into_connection();

    let response = app(db)
        .oneshot(post_json(
            "/api/admin/categories",
            Some("tok"),
            r#"{"name":"Sports","fullName":"Sports records"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_banned_token_is_anonymous() {
    let banned = user::Model {
        status: UserStatus::Banned,
        ..test_user()
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[banned]])
        .into_connection();

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, "Bearer tok")
        .body(Body::empty())
        .unwrap();
    let response = app(db).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_translation_disabled_is_unavailable() {
    let response = app(empty_db())
        .oneshot(post_json(
            "/api/translate",
            None,
            r#"{"texts":["Hello"],"targetLang":"es"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_private_file_needs_signature() {
    let response = app(empty_db())
        .oneshot(get("/api/files/certificates/2025/01/01/cert.pdf"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_bucket_is_not_found() {
    let response = app(empty_db())
        .oneshot(get("/api/files/secrets/a.png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let response = app(empty_db())
        .oneshot(get("/api/nonexistent"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
