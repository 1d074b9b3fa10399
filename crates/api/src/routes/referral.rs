use axum::routing::get;
use axum::Router;

use crate::handlers::referral;
use crate::state::AppState;

/// Routes mounted at `/referrals`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(referral::list_referrals).post(referral::create_referral),
        )
        .route("/stats", get(referral::referral_stats))
}
