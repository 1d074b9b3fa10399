use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /              -> list_notifications
/// PATCH  /              -> bulk_update
/// POST   /              -> create_notification
/// GET    /unread-count  -> unread_count
/// POST   /read-all      -> mark_all_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(notification::list_notifications)
                .patch(notification::bulk_update)
                .post(notification::create_notification),
        )
        .route("/unread-count", get(notification::unread_count))
        .route("/read-all", post(notification::mark_all_read))
}
