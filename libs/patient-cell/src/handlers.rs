use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Session;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{
    PatientSearchQuery, PatientView, PushTokenRequest, RegisterPatientRequest, SetActiveRequest,
};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<Json<Value>, AppError> {
    session.require_admin()?;

    let patient = PatientService::new(&state.db).register(request).await?;

    Ok(Json(json!(PatientView::from(&patient))))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    session.require_admin()?;

    let patients = PatientService::new(&state.db)
        .list(query.search.as_deref())
        .await?;
    let views: Vec<PatientView> = patients.iter().map(PatientView::from).collect();

    Ok(Json(json!({
        "patients": views,
        "total": views.len()
    })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    session.require_admin()?;

    let patient = PatientService::new(&state.db).get(patient_id).await?;

    Ok(Json(json!(PatientView::from(&patient))))
}

#[axum::debug_handler]
pub async fn set_patient_active(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<Value>, AppError> {
    session.require_admin()?;

    let patient = PatientService::new(&state.db)
        .set_active(patient_id, request.is_active)
        .await?;

    Ok(Json(json!(PatientView::from(&patient))))
}

#[axum::debug_handler]
pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let patient_id = session.patient_id()?;

    let patient = PatientService::new(&state.db).get(patient_id).await?;

    Ok(Json(json!(PatientView::from(&patient))))
}

#[axum::debug_handler]
pub async fn set_my_push_token(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<PushTokenRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = session.patient_id()?;

    let patient = PatientService::new(&state.db)
        .set_push_token(patient_id, request.token)
        .await?;

    Ok(Json(json!({
        "push_enabled": patient.push_token.is_some()
    })))
}
