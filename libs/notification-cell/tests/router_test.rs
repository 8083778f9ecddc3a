use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use notification_cell::models::{NotificationKind, OutgoingMessage};
use notification_cell::router::notification_routes;
use notification_cell::services::NotificationDispatcher;
use patient_cell::models::RegisterPatientRequest;
use patient_cell::services::PatientService;
use shared_models::ClinicType;
use shared_utils::test_utils::{TestConfig, TestSession};
use shared_utils::AppState;

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn register(state: &AppState, name: &str) -> Uuid {
    PatientService::new(&state.db)
        .register(RegisterPatientRequest {
            name: name.to_string(),
            phone: "9876543210".to_string(),
            access_code: "4821".to_string(),
            clinic_type: ClinicType::Homeopathy,
        })
        .await
        .unwrap()
        .id
}

fn request(method: &str, uri: &str, bearer: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", bearer)
        .header("content-type", "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_admin_broadcast_reaches_every_active_patient() {
    let config = TestConfig::default();
    let state = config.to_state();
    let asha = register(&state, "Asha").await;
    register(&state, "Ravi").await;
    let app = notification_routes(state);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/broadcast",
            &TestSession::admin().bearer(&config.session_secret),
            Some(json!({ "title": "Clinic closed", "message": "Closed on Sunday" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["recipients"], 2);
    assert_eq!(report["delivered"], 2);
    assert_eq!(report["failures"], json!([]));

    let patient = TestSession::patient(asha, ClinicType::Homeopathy).bearer(&config.session_secret);
    let response = app
        .oneshot(request("GET", "/", &patient, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list["unread_count"], 1);
    assert_eq!(list["notifications"][0]["type"], "health_tip");
    assert_eq!(list["notifications"][0]["title"], "Clinic closed");
}

#[tokio::test]
async fn test_patient_cannot_broadcast() {
    let config = TestConfig::default();
    let app = notification_routes(config.to_state());
    let patient = TestSession::patient(Uuid::new_v4(), ClinicType::LeanLife).bearer(&config.session_secret);

    let response = app
        .oneshot(request(
            "POST",
            "/broadcast",
            &patient,
            Some(json!({ "title": "Hi", "message": "Hello" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_read_all_then_list_shows_zero_unread() {
    let config = TestConfig::default();
    let state = config.to_state();
    let asha = register(&state, "Asha").await;
    let dispatcher = NotificationDispatcher::new(&state);
    for title in ["one", "two"] {
        dispatcher
            .notify_one(asha, &OutgoingMessage::new(title, "body", NotificationKind::General))
            .await
            .unwrap();
    }
    let app = notification_routes(state);
    let patient = TestSession::patient(asha, ClinicType::Homeopathy).bearer(&config.session_secret);

    let response = app
        .clone()
        .oneshot(request("POST", "/read-all", &patient, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["updated"], 2);

    let response = app.oneshot(request("GET", "/", &patient, None)).await.unwrap();
    let list = body_json(response).await;
    assert_eq!(list["unread_count"], 0);
    assert_eq!(list["notifications"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_reading_someone_elses_notification_is_not_found() {
    let config = TestConfig::default();
    let state = config.to_state();
    let asha = register(&state, "Asha").await;
    let record = NotificationDispatcher::new(&state)
        .notify_one(asha, &OutgoingMessage::new("Hi", "Hello", NotificationKind::General))
        .await
        .unwrap();
    let app = notification_routes(state);
    let stranger = TestSession::patient(Uuid::new_v4(), ClinicType::Homeopathy).bearer(&config.session_secret);

    let response = app
        .oneshot(request("POST", &format!("/{}/read", record.id), &stranger, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
