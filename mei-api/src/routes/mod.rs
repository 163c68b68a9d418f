pub mod account;
pub mod admin;
pub mod brackets;
pub mod calculations;
pub mod calculators;
pub mod health;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full HTTP surface. `/health` is public; everything under `/api` except
/// the brackets and calculators requires an identified user.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/brackets", get(brackets::list_brackets))
        .route("/brackets/{year}", get(brackets::get_bracket))
        .route("/calculators/das", post(calculators::das_handler))
        .route("/calculators/monthly-guide", post(calculators::monthly_guide_handler))
        .route("/calculators/revenue-limit", post(calculators::revenue_limit_handler))
        .route("/calculators/margin", post(calculators::margin_handler))
        .route("/calculators/hourly-rate", post(calculators::hourly_rate_handler))
        .route("/me", get(account::me))
        .route("/usage", get(account::usage))
        .route("/badges", get(account::list_badges))
        .route(
            "/calculations",
            get(calculations::list_calculations).post(calculations::save_calculation),
        )
        .route(
            "/calculations/{id}",
            get(calculations::get_calculation).delete(calculations::delete_calculation),
        )
        .route("/admin/users/{id}/plan", put(admin::set_user_plan))
}
