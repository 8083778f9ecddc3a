use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers::*;

pub fn appointment_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_appointments).post(book_appointment))
        .route("/mine", get(list_my_appointments))
        .route("/mine/upcoming", get(list_my_upcoming))
        .route("/stats", get(get_dashboard_stats))
        .route("/{id}", get(get_appointment))
        .route("/{id}/approve", post(approve_appointment))
        .route("/{id}/decline", post(decline_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
