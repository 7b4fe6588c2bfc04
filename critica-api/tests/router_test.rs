/// Router integration tests
///
/// These tests exercise the auth middleware, policy checks and payload
/// validation paths that decide a request before any query runs. The pool
/// is created lazily against an unreachable address, so a test that reached
/// the database would fail loudly instead of passing by accident.
use axum::body::Body;
use axum::http::{Request, StatusCode};
use critica_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig},
    mailer::LogMailer,
};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::Service as _;

const TEST_SECRET: &str = "router-test-secret-key-at-least-32-bytes";

fn test_app() -> axum::Router {
    let config = Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "postgresql://nobody@127.0.0.1:1/unreachable".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        smtp: None,
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database.url)
        .expect("lazy pool should build without connecting");

    build_router(AppState::new(pool, config, Arc::new(LogMailer)))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_anonymous_write_to_catalog_is_401() {
    let mut app = test_app();

    let request = post_json("/v1/categories", json!({ "name": "Films", "slug": "films" }));
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_anonymous_user_listing_is_401() {
    let mut app = test_app();

    let request = Request::builder()
        .uri("/v1/users")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_anonymous_profile_access_is_401() {
    let mut app = test_app();

    let request = Request::builder()
        .uri("/v1/users/me")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_bearer_token_is_401() {
    let mut app = test_app();

    // Even a public read rejects a present-but-invalid token
    let request = Request::builder()
        .uri("/v1/categories")
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_scheme_is_401() {
    let mut app = test_app();

    let request = Request::builder()
        .uri("/v1/genres")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_signed_elsewhere_is_401() {
    let mut app = test_app();

    let claims = critica_shared::auth::jwt::Claims::new(
        uuid::Uuid::new_v4(),
        critica_shared::auth::jwt::TokenType::Refresh,
    );
    let foreign = critica_shared::auth::jwt::create_token(&claims, "a-different-secret").unwrap();

    let request = post_json("/v1/auth/refresh", json!({ "refresh_token": foreign }));
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_malformed_email() {
    let mut app = test_app();

    // Validation fires before any database work; the lazy pool would
    // otherwise turn this into a 500
    let request = post_json("/v1/auth/register", json!({ "email": "not-an-email" }));
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "email");
}

#[tokio::test]
async fn test_activate_rejects_malformed_email() {
    let mut app = test_app();

    let request = post_json(
        "/v1/auth/activate",
        json!({ "email": "nope", "confirmation_code": "1a2b-ffff" }),
    );
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_database_state() {
    let mut app = test_app();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    // The server is up; the unreachable database shows as degraded
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let mut app = test_app();

    let request = Request::builder()
        .uri("/v1/nothing-here")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
