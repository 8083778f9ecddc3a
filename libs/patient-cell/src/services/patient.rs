use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{Collection, Database, Filter, ListQuery};
use shared_utils::password::hash_secret;

use crate::models::{Patient, PatientError, PatientProfile, RegisterPatientRequest};

const LIST_LIMIT: usize = 100;

pub struct PatientService {
    db: Database,
}

impl PatientService {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    pub async fn register(&self, request: RegisterPatientRequest) -> Result<Patient, PatientError> {
        let name = request.name.trim();
        let phone = request.phone.trim();
        let access_code = request.access_code.trim();

        if name.is_empty() || phone.is_empty() || access_code.is_empty() {
            return Err(PatientError::ValidationError(
                "Name, phone and access code are required".to_string(),
            ));
        }

        let access_code_hash =
            hash_secret(access_code).map_err(|e| PatientError::Hashing(e.to_string()))?;

        let profile = PatientProfile {
            name: name.to_string(),
            phone: phone.to_string(),
            access_code_hash,
            clinic_type: request.clinic_type,
            is_active: true,
            push_token: None,
        };

        let patient = self.db.create(Collection::Patients, &profile).await?;
        info!("Registered patient {} for {}", patient.id, patient.clinic_type);
        Ok(patient)
    }

    /// Newest patients first. `search` matches name case-insensitively or phone by substring.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Patient>, PatientError> {
        let query = ListQuery::newest_first().limit(LIST_LIMIT);
        let patients: Vec<Patient> = self.db.find(Collection::Patients, &query).await?;

        let needle = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => needle.to_lowercase(),
            None => return Ok(patients),
        };

        debug!("Filtering {} patients by '{}'", patients.len(), needle);
        Ok(patients
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle) || p.phone.contains(&needle))
            .collect())
    }

    pub async fn get(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        self.db
            .fetch(Collection::Patients, patient_id)
            .await
            .map_err(|e| if e.is_not_found() { PatientError::NotFound } else { e.into() })
    }

    pub async fn set_active(&self, patient_id: Uuid, is_active: bool) -> Result<Patient, PatientError> {
        let patient: Patient = self
            .db
            .patch(Collection::Patients, patient_id, &json!({ "is_active": is_active }))
            .await
            .map_err(|e| if e.is_not_found() { PatientError::NotFound } else { e.into() })?;

        info!("Patient {} active = {}", patient_id, is_active);
        Ok(patient)
    }

    /// Register or clear the device subscription that push notifications go to.
    pub async fn set_push_token(&self, patient_id: Uuid, token: Option<String>) -> Result<Patient, PatientError> {
        let token = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

        let patient: Patient = self
            .db
            .patch(Collection::Patients, patient_id, &json!({ "push_token": token }))
            .await
            .map_err(|e| if e.is_not_found() { PatientError::NotFound } else { e.into() })?;

        debug!("Patient {} push registered: {}", patient_id, patient.push_token.is_some());
        Ok(patient)
    }

    pub async fn active_patients(&self) -> Result<Vec<Patient>, PatientError> {
        let query = ListQuery::new()
            .filter(Filter::eq("is_active", true))
            .order_asc("created_at");
        Ok(self.db.find(Collection::Patients, &query).await?)
    }

    pub async fn count(&self) -> Result<usize, PatientError> {
        Ok(self.db.count(Collection::Patients, &[]).await?)
    }
}
