use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Session;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{BroadcastRequest, OutgoingMessage};
use crate::services::NotificationDispatcher;

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let patient_id = session.patient_id()?;

    let list = NotificationDispatcher::new(&state)
        .list_for_patient(patient_id)
        .await?;

    Ok(Json(json!(list)))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient_id = session.patient_id()?;

    let notification = NotificationDispatcher::new(&state)
        .mark_read(patient_id, notification_id)
        .await?;

    Ok(Json(json!(notification)))
}

#[axum::debug_handler]
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let patient_id = session.patient_id()?;

    let updated = NotificationDispatcher::new(&state)
        .mark_all_read(patient_id)
        .await?;

    Ok(Json(json!({ "updated": updated })))
}

#[axum::debug_handler]
pub async fn broadcast(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<BroadcastRequest>,
) -> Result<Json<Value>, AppError> {
    session.require_admin()?;

    let message = OutgoingMessage::from(request);

    let report = NotificationDispatcher::new(&state)
        .notify_all(&message)
        .await?;

    Ok(Json(json!(report)))
}
