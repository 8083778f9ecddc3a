use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_database::{Collection, Database, Filter, ListQuery};
use shared_models::ClinicType;
use shared_utils::password::verify_secret;

use crate::models::{Candidate, Patient, PatientError, Resolution};

/// Resolves a phone number and access code into a patient of one clinic.
pub struct IdentityResolver {
    db: Database,
}

impl IdentityResolver {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    #[instrument(skip(self, access_code))]
    pub async fn authenticate(
        &self,
        phone: &str,
        access_code: &str,
        clinic_type: ClinicType,
    ) -> Result<Resolution, PatientError> {
        let mut matches = self.matching_patients(phone, access_code, clinic_type).await?;

        match matches.len() {
            0 => {
                warn!("Patient login rejected for {}", clinic_type);
                Err(PatientError::InvalidCredentials)
            }
            1 => {
                let patient = matches.remove(0);
                info!("Patient {} signed in to {}", patient.id, clinic_type);
                Ok(Resolution::Authenticated(patient))
            }
            n => {
                debug!("{} patients share these credentials, selection required", n);
                Ok(Resolution::SelectionRequired(
                    matches.iter().map(Candidate::from).collect(),
                ))
            }
        }
    }

    /// Finish a login that needed disambiguation. The credentials are checked again
    /// and `patient_id` must be one of the matching accounts.
    #[instrument(skip(self, access_code))]
    pub async fn select(
        &self,
        phone: &str,
        access_code: &str,
        clinic_type: ClinicType,
        patient_id: Uuid,
    ) -> Result<Patient, PatientError> {
        let matches = self.matching_patients(phone, access_code, clinic_type).await?;

        let patient = matches
            .into_iter()
            .find(|p| p.id == patient_id)
            .ok_or(PatientError::InvalidCredentials)?;

        info!("Patient {} selected for {}", patient.id, clinic_type);
        Ok(patient)
    }

    async fn matching_patients(
        &self,
        phone: &str,
        access_code: &str,
        clinic_type: ClinicType,
    ) -> Result<Vec<Patient>, PatientError> {
        let phone = phone.trim();
        let access_code = access_code.trim();

        if phone.is_empty() || access_code.is_empty() {
            return Err(PatientError::ValidationError(
                "Enter phone and access code".to_string(),
            ));
        }
        if !clinic_type.is_concrete() {
            return Err(PatientError::ValidationError(
                "Choose a clinic to sign in to".to_string(),
            ));
        }

        let query = ListQuery::new()
            .filter(Filter::eq("phone", phone))
            .filter(Filter::eq("is_active", true))
            .filter(Filter::any_of(
                "clinic_type",
                clinic_type.visible_scopes().iter().map(ClinicType::as_str),
            ))
            .order_asc("created_at");

        let candidates: Vec<Patient> = self.db.find(Collection::Patients, &query).await?;

        Ok(candidates
            .into_iter()
            .filter(|p| verify_secret(access_code, &p.access_code_hash))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    use crate::models::RegisterPatientRequest;
    use crate::services::PatientService;

    async fn register(db: &Database, name: &str, phone: &str, code: &str, clinic: ClinicType) -> Patient {
        PatientService::new(db)
            .register(RegisterPatientRequest {
                name: name.to_string(),
                phone: phone.to_string(),
                access_code: code.to_string(),
                clinic_type: clinic,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn single_match_authenticates() {
        let db = Database::memory();
        let asha = register(&db, "Asha", "9876543210", "4821", ClinicType::Homeopathy).await;

        let resolution = IdentityResolver::new(&db)
            .authenticate("9876543210", "4821", ClinicType::Homeopathy)
            .await
            .unwrap();

        assert_matches!(resolution, Resolution::Authenticated(p) if p.id == asha.id);
    }

    #[tokio::test]
    async fn wrong_phone_and_wrong_code_fail_identically() {
        let db = Database::memory();
        register(&db, "Asha", "9876543210", "4821", ClinicType::Homeopathy).await;
        let resolver = IdentityResolver::new(&db);

        let wrong_phone = resolver
            .authenticate("9000000000", "4821", ClinicType::Homeopathy)
            .await
            .unwrap_err();
        let wrong_code = resolver
            .authenticate("9876543210", "0000", ClinicType::Homeopathy)
            .await
            .unwrap_err();

        assert_matches!(wrong_phone, PatientError::InvalidCredentials);
        assert_matches!(wrong_code, PatientError::InvalidCredentials);
        assert_eq!(wrong_phone.to_string(), wrong_code.to_string());
    }

    #[tokio::test]
    async fn inactive_and_other_clinic_patients_cannot_sign_in() {
        let db = Database::memory();
        let asha = register(&db, "Asha", "9876543210", "4821", ClinicType::LeanLife).await;
        let resolver = IdentityResolver::new(&db);

        assert_matches!(
            resolver.authenticate("9876543210", "4821", ClinicType::Homeopathy).await,
            Err(PatientError::InvalidCredentials)
        );

        PatientService::new(&db).set_active(asha.id, false).await.unwrap();
        assert_matches!(
            resolver.authenticate("9876543210", "4821", ClinicType::LeanLife).await,
            Err(PatientError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn shared_patients_sign_in_to_either_clinic() {
        let db = Database::memory();
        register(&db, "Asha", "9876543210", "4821", ClinicType::Both).await;
        let resolver = IdentityResolver::new(&db);

        for clinic in [ClinicType::Homeopathy, ClinicType::LeanLife] {
            assert_matches!(
                resolver.authenticate("9876543210", "4821", clinic).await,
                Ok(Resolution::Authenticated(_))
            );
        }
    }

    #[tokio::test]
    async fn shared_credentials_require_selection() {
        let db = Database::memory();
        let mother = register(&db, "Lakshmi", "9876543210", "4821", ClinicType::Homeopathy).await;
        let son = register(&db, "Arjun", "9876543210", "4821", ClinicType::Both).await;
        register(&db, "Other", "9876543210", "9999", ClinicType::Homeopathy).await;
        let resolver = IdentityResolver::new(&db);

        let resolution = resolver
            .authenticate("9876543210", "4821", ClinicType::Homeopathy)
            .await
            .unwrap();

        let candidates = match resolution {
            Resolution::SelectionRequired(candidates) => candidates,
            other => panic!("expected selection, got {:?}", other),
        };
        let mut ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
        ids.sort();
        let mut expected = vec![mother.id, son.id];
        expected.sort();
        assert_eq!(ids, expected);

        let chosen = resolver
            .select("9876543210", "4821", ClinicType::Homeopathy, son.id)
            .await
            .unwrap();
        assert_eq!(chosen.id, son.id);
    }

    #[tokio::test]
    async fn selecting_outside_the_candidates_is_rejected() {
        let db = Database::memory();
        register(&db, "Lakshmi", "9876543210", "4821", ClinicType::Homeopathy).await;
        let stranger = register(&db, "Other", "9123456780", "1111", ClinicType::Homeopathy).await;

        let result = IdentityResolver::new(&db)
            .select("9876543210", "4821", ClinicType::Homeopathy, stranger.id)
            .await;

        assert_matches!(result, Err(PatientError::InvalidCredentials));
    }

    #[tokio::test]
    async fn blank_credentials_are_a_validation_error() {
        let resolver = IdentityResolver::new(&Database::memory());

        assert_matches!(
            resolver.authenticate("", "4821", ClinicType::Homeopathy).await,
            Err(PatientError::ValidationError(_))
        );
        assert_matches!(
            resolver.authenticate("9876543210", "4821", ClinicType::Both).await,
            Err(PatientError::ValidationError(_))
        );
    }
}
