use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::{Record, StoreError};
use shared_models::error::AppError;
use shared_models::ClinicType;

pub const INVALID_CREDENTIALS: &str = "Invalid phone number or access code";

/// Editable fields of a patient row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub name: String,
    pub phone: String,
    pub access_code_hash: String,
    pub clinic_type: ClinicType,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub push_token: Option<String>,
}

fn default_active() -> bool {
    true
}

pub type Patient = Record<PatientProfile>;

/// What the API returns for a patient. The access code hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub phone: String,
    pub clinic_type: ClinicType,
    pub is_active: bool,
    pub push_enabled: bool,
}

impl From<&Patient> for PatientView {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            created_at: patient.created_at,
            name: patient.name.clone(),
            phone: patient.phone.clone(),
            clinic_type: patient.clinic_type,
            is_active: patient.is_active,
            push_enabled: patient.push_token.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPatientRequest {
    pub name: String,
    pub phone: String,
    pub access_code: String,
    #[serde(default = "default_clinic")]
    pub clinic_type: ClinicType,
}

fn default_clinic() -> ClinicType {
    ClinicType::Homeopathy
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushTokenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientSearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientLoginRequest {
    pub phone: String,
    pub access_code: String,
    pub clinic_type: ClinicType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSelectRequest {
    pub phone: String,
    pub access_code: String,
    pub clinic_type: ClinicType,
    pub patient_id: Uuid,
}

/// One entry of a disambiguation set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub clinic_type: ClinicType,
}

impl From<&Patient> for Candidate {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name.clone(),
            clinic_type: patient.clinic_type,
        }
    }
}

/// Outcome of checking a patient's phone and access code.
#[derive(Debug, Clone)]
pub enum Resolution {
    Authenticated(Patient),
    SelectionRequired(Vec<Candidate>),
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Failed to hash access code: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
            PatientError::InvalidCredentials => AppError::Auth(INVALID_CREDENTIALS.to_string()),
            PatientError::ValidationError(msg) => AppError::ValidationError(msg),
            PatientError::Hashing(msg) => AppError::Internal(msg),
            PatientError::Store(e) if e.is_not_found() => {
                AppError::NotFound("Patient not found".to_string())
            }
            PatientError::Store(e) => AppError::from(e),
        }
    }
}
