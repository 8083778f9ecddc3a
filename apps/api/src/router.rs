use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use appointment_cell::router::appointment_routes;
use auth_cell::router::{auth_routes, settings_routes};
use content_cell::router::content_routes;
use notification_cell::router::notification_routes;
use patient_cell::router::patient_routes;
use shared_utils::AppState;

pub fn create_router(state: AppState) -> Router {
    let configured = state.config.is_configured();

    Router::new()
        .route("/", get(|| async { "MyClinic API is running!" }))
        .route("/health", get(move || health(configured)))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/notifications", notification_routes(state.clone()))
        .nest("/content", content_routes(state.clone()))
        .nest("/settings", settings_routes(state))
}

async fn health(configured: bool) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "configured": configured,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use shared_utils::test_utils::TestConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_configuration() {
        let app = create_router(TestConfig::default().to_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["configured"], true);
    }

    #[tokio::test]
    async fn cells_are_mounted_under_their_prefixes() {
        let app = create_router(TestConfig::default().to_state());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/content/banners").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/patients/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
