use axum::{
    middleware,
    routing::{get, patch, put},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers::*;

pub fn patient_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_patients).post(register_patient))
        .route("/me", get(get_my_profile))
        .route("/me/push-token", put(set_my_push_token))
        .route("/{id}", get(get_patient))
        .route("/{id}/active", patch(set_patient_active))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
