use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Session;
use shared_models::error::AppError;
use shared_models::ClinicType;
use shared_utils::AppState;

use crate::models::{
    Banner, ClinicInfo, CreateBannerRequest, CreateFlashcardRequest, FlashcardCreated,
    FlashcardQuery, UpdateClinicInfoRequest,
};
use crate::services::{BannerService, ClinicInfoService, FlashcardService};

// ==============================================================================
// BANNER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_banners(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let banners = BannerService::new(&state.db).list_active().await?;

    Ok(Json(json!({ "banners": banners })))
}

#[axum::debug_handler]
pub async fn list_all_banners(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    session.require_admin()?;

    let banners = BannerService::new(&state.db).list_all().await?;

    Ok(Json(json!({ "banners": banners })))
}

#[axum::debug_handler]
pub async fn create_banner(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateBannerRequest>,
) -> Result<(StatusCode, Json<Banner>), AppError> {
    session.require_admin()?;

    let banner = BannerService::new(&state.db).create(request).await?;

    Ok((StatusCode::CREATED, Json(banner)))
}

#[axum::debug_handler]
pub async fn delete_banner(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(banner_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session.require_admin()?;

    BannerService::new(&state.db).delete(banner_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// CLINIC INFO HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_clinics(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let clinics = ClinicInfoService::new(&state.db).list().await?;

    Ok(Json(json!({ "clinics": clinics })))
}

#[axum::debug_handler]
pub async fn get_clinic(
    State(state): State<AppState>,
    Path(clinic_type): Path<ClinicType>,
) -> Result<Json<ClinicInfo>, AppError> {
    let info = ClinicInfoService::new(&state.db).get(clinic_type).await?;

    Ok(Json(info))
}

#[axum::debug_handler]
pub async fn update_clinic(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(clinic_type): Path<ClinicType>,
    Json(request): Json<UpdateClinicInfoRequest>,
) -> Result<Json<ClinicInfo>, AppError> {
    session.require_admin()?;

    let info = ClinicInfoService::new(&state.db)
        .upsert(clinic_type, request)
        .await?;

    Ok(Json(info))
}

// ==============================================================================
// FLASHCARD HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_flashcards(
    State(state): State<AppState>,
    Query(query): Query<FlashcardQuery>,
) -> Result<Json<Value>, AppError> {
    let flashcards = FlashcardService::new(&state)
        .list(query.clinic_type, query.search.as_deref())
        .await?;

    Ok(Json(json!({
        "total": flashcards.len(),
        "flashcards": flashcards,
    })))
}

#[axum::debug_handler]
pub async fn create_flashcard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateFlashcardRequest>,
) -> Result<(StatusCode, Json<FlashcardCreated>), AppError> {
    session.require_admin()?;

    let created = FlashcardService::new(&state).create(request).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[axum::debug_handler]
pub async fn delete_flashcard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(flashcard_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session.require_admin()?;

    FlashcardService::new(&state).delete(flashcard_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
