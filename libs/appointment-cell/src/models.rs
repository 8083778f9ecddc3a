use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::{Record, StoreError};
use shared_models::ClinicType;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Declined,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable fields of an appointment request. Patient name, phone and clinic are
/// a snapshot taken at booking time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentFields {
    pub patient_id: Uuid,
    pub patient_name: String,
    pub phone: String,
    pub clinic_type: ClinicType,
    pub preferred_date: NaiveDate,
    pub preferred_time: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub decline_reason: Option<String>,
}

pub type Appointment = Record<AppointmentFields>;

/// Who is booking: the signed-in patient and the clinic they signed in to.
#[derive(Debug, Clone)]
pub struct PatientSnapshot {
    pub patient_id: Uuid,
    pub name: String,
    pub phone: String,
    pub clinic_type: ClinicType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(default)]
    pub preferred_date: String,
    #[serde(default)]
    pub preferred_time: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclineAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentListQuery {
    pub status: Option<AppointmentStatus>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_patients: usize,
    pub pending: usize,
    pub today_confirmed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Appointment is already {from} and cannot become {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
