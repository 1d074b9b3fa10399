pub mod activity;
pub mod auth;
pub mod health;
pub mod notification;
pub mod referral;
pub mod webhook;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::middleware::auth::require_auth;
use crate::state::AppState;

/// Build the resource route tree.
///
/// ```text
/// /auth/login                    login (public)
/// /auth/refresh                  refresh (public)
/// /auth/me                       current user (bearer token)
///
/// /activities                    list, create
/// /activities/{id}               get, update, delete
///
/// /notifications                 list, bulk read/unread, create (producer)
/// /notifications/unread-count    unread count
/// /notifications/read-all        mark all read
///
/// /referrals                     list own, create
/// /referrals/stats               counts per owner
///
/// /webhooks                      list, create
/// /webhooks/{id}                 get, delete
/// ```
///
/// Every resource router sits behind [`require_auth`].
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let authed = from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .nest("/auth", auth::router())
        .nest("/activities", activity::router().route_layer(authed.clone()))
        .nest(
            "/notifications",
            notification::router().route_layer(authed.clone()),
        )
        .nest("/referrals", referral::router().route_layer(authed.clone()))
        .nest("/webhooks", webhook::router().route_layer(authed))
}
