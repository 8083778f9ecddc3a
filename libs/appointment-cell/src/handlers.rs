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
    AppointmentError, AppointmentListQuery, BookAppointmentRequest, DeclineAppointmentRequest,
};
use crate::services::booking::AppointmentBookingService;

fn to_app_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(e.to_string()),
        AppointmentError::Unauthorized => AppError::Forbidden(e.to_string()),
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        AppointmentError::Store(e) => AppError::from(e),
    }
}

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = session.patient_id()?;
    let clinic_type = session.clinic()?;

    let booking_service = AppointmentBookingService::new(&state);

    let snapshot = booking_service
        .patient_snapshot(patient_id, clinic_type)
        .await
        .map_err(to_app_error)?;

    let appointment = booking_service
        .create(snapshot, request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_my_appointments(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let patient_id = session.patient_id()?;

    let appointments = AppointmentBookingService::new(&state)
        .list_for_patient(patient_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn list_my_upcoming(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let patient_id = session.patient_id()?;
    let today = state.config.clinic_today();

    let appointments = AppointmentBookingService::new(&state)
        .list_upcoming_confirmed(patient_id, today)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "next": appointments.first(),
        "appointments": appointments,
        "total": appointments.len()
    })))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    session.require_admin()?;

    let appointments = AppointmentBookingService::new(&state)
        .list_all(query.status, query.limit)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_dashboard_stats(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    session.require_admin()?;

    let stats = AppointmentBookingService::new(&state)
        .dashboard_stats(state.config.clinic_today())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(stats)))
}

/// Admins see any appointment; patients only their own.
#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .get(appointment_id)
        .await
        .map_err(to_app_error)?;

    if !session.is_admin() && session.patient_id()? != appointment.patient_id {
        return Err(to_app_error(AppointmentError::Unauthorized));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn approve_appointment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    session.require_admin()?;

    let appointment = AppointmentBookingService::new(&state)
        .approve(appointment_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn decline_appointment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<DeclineAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    session.require_admin()?;

    let appointment = AppointmentBookingService::new(&state)
        .decline(appointment_id, request.reason)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(appointment)))
}
