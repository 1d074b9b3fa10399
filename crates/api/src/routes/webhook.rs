use axum::routing::get;
use axum::Router;

use crate::handlers::webhook;
use crate::state::AppState;

/// Routes mounted at `/webhooks`. There is no update route.
///
/// ```text
/// GET    /       -> list_webhooks
/// POST   /       -> create_webhook
/// GET    /{id}   -> get_webhook
/// DELETE /{id}   -> delete_webhook
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(webhook::list_webhooks).post(webhook::create_webhook))
        .route(
            "/{id}",
            get(webhook::get_webhook).delete(webhook::delete_webhook),
        )
}
