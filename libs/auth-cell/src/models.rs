use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use patient_cell::models::{Candidate, PatientView};
use shared_database::{Record, StoreError};
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub password: String,
}

/// Result of a patient login attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatientLoginResponse {
    Authenticated {
        token: String,
        expires_at: DateTime<Utc>,
        patient: PatientView,
    },
    SelectionRequired {
        candidates: Vec<Candidate>,
    },
}

/// The practice-wide settings row. Only one exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminSettingsFields {
    #[serde(default)]
    pub admin_password_hash: Option<String>,
    #[serde(default)]
    pub homeopathy_whatsapp: Option<String>,
    #[serde(default)]
    pub leanlife_whatsapp: Option<String>,
}

pub type AdminSettings = Record<AdminSettingsFields>;

/// Settings as shown to the admin. The password hash is reduced to a flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsView {
    pub homeopathy_whatsapp: Option<String>,
    pub leanlife_whatsapp: Option<String>,
    pub admin_password_set: bool,
}

impl From<&AdminSettingsFields> for SettingsView {
    fn from(settings: &AdminSettingsFields) -> Self {
        Self {
            homeopathy_whatsapp: settings.homeopathy_whatsapp.clone(),
            leanlife_whatsapp: settings.leanlife_whatsapp.clone(),
            admin_password_set: settings.admin_password_hash.is_some(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    pub admin_password: Option<String>,
    pub homeopathy_whatsapp: Option<String>,
    pub leanlife_whatsapp: Option<String>,
}

/// Public WhatsApp numbers for the contact buttons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactNumbers {
    pub homeopathy_whatsapp: Option<String>,
    pub leanlife_whatsapp: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Admin password has not been set up")]
    NotConfigured,

    #[error("Session error: {0}")]
    Session(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::IncorrectPassword => AppError::Auth(err.to_string()),
            AuthError::NotConfigured => AppError::ServiceUnavailable(err.to_string()),
            AuthError::Session(msg) => AppError::Internal(msg),
            AuthError::ValidationError(msg) => AppError::ValidationError(msg),
            AuthError::Hashing(msg) => AppError::Internal(msg),
            AuthError::Store(e) => AppError::from(e),
        }
    }
}
