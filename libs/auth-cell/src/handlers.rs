use axum::{
    extract::{Extension, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use patient_cell::models::{PatientLoginRequest, PatientSelectRequest, PatientView, Resolution};
use patient_cell::services::IdentityResolver;
use shared_models::auth::{Role, Session, TokenResponse};
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;
use shared_utils::AppState;

use crate::models::{
    AdminLoginRequest, AdminSettingsFields, PatientLoginResponse, SettingsView,
    UpdateSettingsRequest,
};
use crate::services::{SessionIssuer, SettingsService};

// ==============================================================================
// LOGIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn patient_login(
    State(state): State<AppState>,
    Json(request): Json<PatientLoginRequest>,
) -> Result<Json<PatientLoginResponse>, AppError> {
    let resolution = IdentityResolver::new(&state.db)
        .authenticate(&request.phone, &request.access_code, request.clinic_type)
        .await?;

    let response = match resolution {
        Resolution::Authenticated(patient) => {
            let (token, expires_at) =
                SessionIssuer::new(&state.config).for_patient(&patient, request.clinic_type)?;
            PatientLoginResponse::Authenticated {
                token,
                expires_at,
                patient: PatientView::from(&patient),
            }
        }
        Resolution::SelectionRequired(candidates) => {
            PatientLoginResponse::SelectionRequired { candidates }
        }
    };

    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn patient_select(
    State(state): State<AppState>,
    Json(request): Json<PatientSelectRequest>,
) -> Result<Json<PatientLoginResponse>, AppError> {
    let patient = IdentityResolver::new(&state.db)
        .select(
            &request.phone,
            &request.access_code,
            request.clinic_type,
            request.patient_id,
        )
        .await?;

    let (token, expires_at) =
        SessionIssuer::new(&state.config).for_patient(&patient, request.clinic_type)?;

    Ok(Json(PatientLoginResponse::Authenticated {
        token,
        expires_at,
        patient: PatientView::from(&patient),
    }))
}

#[axum::debug_handler]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    SettingsService::new(&state.db)
        .verify_admin(&request.password, state.config.admin_bootstrap_password.as_deref())
        .await?;

    let (token, expires_at) = SessionIssuer::new(&state.config).for_admin()?;

    Ok(Json(TokenResponse {
        token,
        role: Role::Admin,
        expires_at,
    }))
}

/// The session behind the presented token: who is signed in and where.
#[axum::debug_handler]
pub async fn current_session(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<Session>, AppError> {
    let TypedHeader(auth) =
        auth.ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let session = validate_token(auth.token(), &state.config.session_secret).map_err(AppError::Auth)?;
    debug!("Session loaded for {:?} {}", session.role, session.subject);

    Ok(Json(session))
}

// ==============================================================================
// SETTINGS HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<SettingsView>, AppError> {
    session.require_admin()?;

    let settings = SettingsService::new(&state.db).load().await?;
    let view = settings
        .map(|s| SettingsView::from(&s.data))
        .unwrap_or_else(|| SettingsView::from(&AdminSettingsFields::default()));

    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsView>, AppError> {
    session.require_admin()?;

    let settings = SettingsService::new(&state.db).update(request).await?;

    Ok(Json(SettingsView::from(&settings.data)))
}

#[axum::debug_handler]
pub async fn get_contact_numbers(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let contact = SettingsService::new(&state.db).contact().await?;

    Ok(Json(json!(contact)))
}
