use chrono::{DateTime, Utc};
use tracing::info;

use patient_cell::models::Patient;
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_models::ClinicType;
use shared_utils::jwt::issue_session;

use crate::models::AuthError;

const ADMIN_SUBJECT: &str = "admin";

/// Issues signed session tokens for successful logins.
pub struct SessionIssuer {
    secret: String,
    ttl_hours: i64,
}

impl SessionIssuer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            secret: config.session_secret.clone(),
            ttl_hours: config.session_ttl_hours,
        }
    }

    pub fn for_patient(
        &self,
        patient: &Patient,
        clinic_type: ClinicType,
    ) -> Result<(String, DateTime<Utc>), AuthError> {
        let (token, session) = issue_session(
            &patient.id.to_string(),
            Role::Patient,
            Some(clinic_type),
            &self.secret,
            self.ttl_hours,
        )
        .map_err(AuthError::Session)?;

        info!("Patient session issued for {} at {}", patient.id, clinic_type);
        Ok((token, session.expires_at))
    }

    pub fn for_admin(&self) -> Result<(String, DateTime<Utc>), AuthError> {
        let (token, session) = issue_session(ADMIN_SUBJECT, Role::Admin, None, &self.secret, self.ttl_hours)
            .map_err(AuthError::Session)?;

        info!("Admin session issued");
        Ok((token, session.expires_at))
    }
}
