use serde::{Deserialize, Serialize};

use notification_cell::models::BroadcastReport;
use shared_database::{Record, StoreError};
use shared_models::error::AppError;
use shared_models::ClinicType;

fn default_active() -> bool {
    true
}

// ==============================================================================
// BANNERS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerFields {
    pub image_url: String,
    pub display_order: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

pub type Banner = Record<BannerFields>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBannerRequest {
    #[serde(default)]
    pub image_url: String,
}

// ==============================================================================
// CLINIC INFO
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicInfoFields {
    pub clinic_type: ClinicType,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub maps_url: Option<String>,
    #[serde(default)]
    pub cover_photo_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

pub type ClinicInfo = Record<ClinicInfoFields>;

/// Fields to change on a clinic page. Absent fields stay as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClinicInfoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maps_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ==============================================================================
// FLASHCARDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardFields {
    pub title: String,
    #[serde(default)]
    pub front_description: String,
    pub back_content: String,
    #[serde(default)]
    pub front_image_url: String,
    pub clinic_type: ClinicType,
    pub display_order: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

pub type Flashcard = Record<FlashcardFields>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFlashcardRequest {
    #[serde(default)]
    pub title: String,
    pub front_description: Option<String>,
    #[serde(default)]
    pub back_content: String,
    pub front_image_url: Option<String>,
    #[serde(default = "default_card_clinic")]
    pub clinic_type: ClinicType,
}

fn default_card_clinic() -> ClinicType {
    ClinicType::Homeopathy
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlashcardQuery {
    pub clinic_type: Option<ClinicType>,
    pub search: Option<String>,
}

/// A new flashcard and the outcome of announcing it to patients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardCreated {
    pub flashcard: Flashcard,
    pub broadcast: Option<BroadcastReport>,
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound(_) => AppError::NotFound(err.to_string()),
            ContentError::ValidationError(msg) => AppError::ValidationError(msg),
            ContentError::Store(e) => AppError::from(e),
        }
    }
}
