use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers::*;

/// Banners, clinic pages and flashcards. Reads are public, writes need an admin session.
pub fn content_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/banners", get(list_banners))
        .route("/clinics", get(list_clinics))
        .route("/clinics/{clinic_type}", get(get_clinic))
        .route("/flashcards", get(list_flashcards));

    let protected_routes = Router::new()
        .route("/banners", post(create_banner))
        .route("/banners/all", get(list_all_banners))
        .route("/banners/{id}", delete(delete_banner))
        .route("/clinics/{clinic_type}", put(update_clinic))
        .route("/flashcards", post(create_flashcard))
        .route("/flashcards/{id}", delete(delete_flashcard))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
