use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clinic::ClinicType;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Admin,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub role: Role,
    pub clinic_type: Option<ClinicType>,
    pub iat: i64,
    pub exp: i64,
}

/// The logged-in actor for one request: a patient bound to the clinic they
/// signed in through, or the practice admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub subject: String,
    pub role: Role,
    pub clinic_type: Option<ClinicType>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Patient id of a patient session.
    pub fn patient_id(&self) -> Result<Uuid, AppError> {
        if self.role != Role::Patient {
            return Err(AppError::Forbidden("Patient session required".to_string()));
        }

        Uuid::parse_str(&self.subject)
            .map_err(|_| AppError::Auth("Invalid session subject".to_string()))
    }

    /// Clinic a patient session is bound to.
    pub fn clinic(&self) -> Result<ClinicType, AppError> {
        self.clinic_type
            .filter(ClinicType::is_concrete)
            .ok_or_else(|| AppError::Auth("Session is not bound to a clinic".to_string()))
    }
}

impl From<SessionClaims> for Session {
    fn from(claims: SessionClaims) -> Self {
        Self {
            subject: claims.sub,
            role: claims.role,
            clinic_type: claims.clinic_type,
            issued_at: DateTime::from_timestamp(claims.iat, 0).unwrap_or_default(),
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}
