#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use crm_api::auth::jwt::{issue, JwtConfig, TokenKind};
use crm_api::auth::password::hash_password;
use crm_api::config::{DatabaseConfig, ServerConfig};
use crm_api::middleware::auth::AuthUser;
use crm_api::router::build_app_router;
use crm_api::state::AppState;
use crm_db::migrate::{Runner, SqlFileSet};
use crm_db::models::user::{CreateUser, User};
use crm_db::repositories::UserRepo;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

/// Password given to every user created by [`create_user`].
pub const PASSWORD: &str = "correct-horse-battery";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        run_migrations: false,
        uploads_dir: std::env::temp_dir(),
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            acquire_timeout_secs: 5,
            migrations_dir: migrations_dir().into(),
            seeds_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/../../db/seeds").into(),
        },
        jwt: JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_expiry_mins: 15,
            refresh_expiry_days: 7,
        },
    }
}

fn migrations_dir() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../db/migrations")
}

/// Apply the workspace migrations to a fresh test database.
pub async fn migrate(pool: &PgPool) {
    let files = SqlFileSet::from_dir(migrations_dir()).expect("migrations should load");
    Runner::migrations()
        .run(pool, &files)
        .await
        .expect("migrations should apply");
}

/// Migrate `pool` and build the production router on top of it.
pub async fn build_test_app(pool: PgPool) -> Router {
    migrate(&pool).await;
    build_app_router(AppState::new(pool, test_config()))
}

static NEXT_CODE: AtomicU64 = AtomicU64::new(1);

/// Insert an active user with [`PASSWORD`] and the given role.
pub async fn create_user(pool: &PgPool, email: &str, role: &str) -> User {
    let code11 = format!("{:011}", NEXT_CODE.fetch_add(1, Ordering::Relaxed));
    UserRepo::create(
        pool,
        &CreateUser {
            code11,
            email: email.to_string(),
            password_hash: hash_password(PASSWORD).unwrap(),
            role: role.to_string(),
            permissions: vec![],
            scopes: Default::default(),
        },
    )
    .await
    .expect("user creation should succeed")
}

/// A valid access token for `user`.
pub fn token_for(user: &User) -> String {
    let principal = AuthUser::from_user(user).unwrap();
    issue(TokenKind::Access, &principal, &test_config().jwt).unwrap()
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, token, Some(body)).await
}

pub async fn patch_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    send(app, Method::PATCH, uri, token, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, Method::DELETE, uri, token, None).await
}

/// Read the full body as JSON (`Null` for an empty body).
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// Audit writes are fire-and-forget; poll until the row shows up.
pub async fn wait_for_audit(pool: &PgPool, action: &str, entity_id: Option<i64>) -> i64 {
    for _ in 0..100 {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM audit_log \
             WHERE action = $1 AND ($2::BIGINT IS NULL OR entity_id = $2)",
        )
        .bind(action)
        .bind(entity_id)
        .fetch_one(pool)
        .await
        .unwrap();
        if count > 0 {
            return count;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    0
}
