//! Shared application router builder.
//!
//! Both the server binary and the integration tests call
//! [`build_app_router`], so tests exercise the production middleware stack.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::extract::CORRELATION_ID_HEADER;
use crate::middleware::errors::{handle_panic, render_errors};
use crate::routes;
use crate::state::AppState;

/// Build the full application [`Router`] with all middleware layers.
///
/// The middleware stack is applied bottom-up:
///
/// 1. CORS
/// 2. Set the correlation id on incoming requests (kept if the client sent one)
/// 3. Request/response tracing
/// 4. Echo the correlation id on the response
/// 5. Error envelope rendering
/// 6. Request timeout
/// 7. Panic recovery
pub fn build_app_router(state: AppState) -> Router {
    let config = state.config.clone();
    let correlation_header = HeaderName::from_static(CORRELATION_ID_HEADER);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::api_routes(&state))
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .fallback(route_not_found)
        // -- Middleware stack (applied bottom-up) --
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(axum::middleware::from_fn(render_errors))
        .layer(PropagateRequestIdLayer::new(correlation_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(correlation_header, MakeRequestUuid))
        .layer(build_cors_layer(&config))
        .with_state(state)
}

async fn route_not_found() -> AppError {
    AppError::RouteNotFound
}

/// CORS for the configured origins. Origins were validated when the
/// configuration was loaded.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(CORRELATION_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(CORRELATION_ID_HEADER)])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
