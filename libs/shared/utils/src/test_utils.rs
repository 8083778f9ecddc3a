use shared_config::{AppConfig, StoreBackend};
use shared_database::Database;
use shared_models::auth::Role;
use shared_models::ClinicType;
use uuid::Uuid;

use crate::jwt::issue_session;
use crate::state::AppState;

pub struct TestConfig {
    pub session_secret: String,
    pub supabase_url: String,
    pub supabase_api_key: String,
    pub onesignal_base_url: String,
    pub admin_bootstrap_password: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            session_secret: "test-secret-key-for-session-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_api_key: "test-service-key".to_string(),
            onesignal_base_url: String::new(),
            admin_bootstrap_password: None,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_api_key: self.supabase_api_key.clone(),
            session_secret: self.session_secret.clone(),
            session_ttl_hours: 24,
            store_backend: StoreBackend::Memory,
            store_timeout_secs: 5,
            onesignal_app_id: String::new(),
            onesignal_api_key: String::new(),
            onesignal_base_url: self.onesignal_base_url.clone(),
            broadcast_concurrency: 4,
            admin_bootstrap_password: self.admin_bootstrap_password.clone(),
            clinic_utc_offset_minutes: 0,
            port: 0,
        }
    }

    /// Router state over a fresh in-memory store.
    pub fn to_state(&self) -> AppState {
        AppState::with_database(self.to_app_config(), Database::memory())
    }
}

pub struct TestSession {
    pub subject: String,
    pub role: Role,
    pub clinic_type: Option<ClinicType>,
}

impl TestSession {
    pub fn patient(patient_id: Uuid, clinic_type: ClinicType) -> Self {
        Self {
            subject: patient_id.to_string(),
            role: Role::Patient,
            clinic_type: Some(clinic_type),
        }
    }

    pub fn admin() -> Self {
        Self {
            subject: "admin".to_string(),
            role: Role::Admin,
            clinic_type: None,
        }
    }

    pub fn token(&self, secret: &str) -> String {
        self.token_with_ttl(secret, 24)
    }

    pub fn expired_token(&self, secret: &str) -> String {
        self.token_with_ttl(secret, -1)
    }

    fn token_with_ttl(&self, secret: &str, ttl_hours: i64) -> String {
        let (token, _) = issue_session(&self.subject, self.role, self.clinic_type, secret, ttl_hours)
            .expect("test session secret is set");
        token
    }

    pub fn bearer(&self, secret: &str) -> String {
        format!("Bearer {}", self.token(secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.store_backend, StoreBackend::Memory);
        assert!(!app_config.session_secret.is_empty());
        assert!(!app_config.is_push_configured());
    }

    #[test]
    fn test_patient_session_token() {
        let config = TestConfig::default();
        let patient_id = Uuid::new_v4();
        let token = TestSession::patient(patient_id, ClinicType::Homeopathy).token(&config.session_secret);

        let session = validate_token(&token, &config.session_secret).unwrap();
        assert_eq!(session.patient_id().unwrap(), patient_id);
        assert_eq!(session.clinic().unwrap(), ClinicType::Homeopathy);
    }

    #[test]
    fn test_admin_session_is_not_a_patient() {
        let config = TestConfig::default();
        let token = TestSession::admin().token(&config.session_secret);

        let session = validate_token(&token, &config.session_secret).unwrap();
        tokio_test::assert_ok!(session.require_admin());
        tokio_test::assert_err!(session.patient_id());
    }
}
