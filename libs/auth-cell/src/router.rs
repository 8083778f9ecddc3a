use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/patient/login", post(handlers::patient_login))
        .route("/patient/select", post(handlers::patient_select))
        .route("/admin/login", post(handlers::admin_login))
        .route("/session", get(handlers::current_session))
        .with_state(state)
}

pub fn settings_routes(state: AppState) -> Router {
    let public_routes = Router::new().route("/contact", get(handlers::get_contact_numbers));

    let protected_routes = Router::new()
        .route("/", get(handlers::get_settings).put(handlers::update_settings))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
