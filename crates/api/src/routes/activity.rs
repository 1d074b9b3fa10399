use axum::routing::get;
use axum::Router;

use crate::handlers::activity;
use crate::state::AppState;

/// Routes mounted at `/activities`.
///
/// ```text
/// GET    /       -> list_activities
/// POST   /       -> create_activity
/// GET    /{id}   -> get_activity
/// PATCH  /{id}   -> update_activity
/// DELETE /{id}   -> delete_activity
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(activity::list_activities).post(activity::create_activity),
        )
        .route(
            "/{id}",
            get(activity::get_activity)
                .patch(activity::update_activity)
                .delete(activity::delete_activity),
        )
}
