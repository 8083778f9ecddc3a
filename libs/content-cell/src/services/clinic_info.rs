use serde_json::Value;
use tracing::info;

use shared_database::{Collection, Database, Filter, ListQuery, StoreError};
use shared_models::ClinicType;

use crate::models::{ClinicInfo, ClinicInfoFields, ContentError, UpdateClinicInfoRequest};

/// The "about" page of each clinic: doctor, address, map link and photo.
pub struct ClinicInfoService {
    db: Database,
}

impl ClinicInfoService {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    pub async fn list(&self) -> Result<Vec<ClinicInfo>, ContentError> {
        let query = ListQuery::new().order_asc("clinic_type");
        Ok(self.db.find(Collection::ClinicInfo, &query).await?)
    }

    pub async fn find(&self, clinic_type: ClinicType) -> Result<Option<ClinicInfo>, ContentError> {
        let query = ListQuery::new().filter(Filter::eq("clinic_type", clinic_type.as_str()));
        Ok(self.db.find_first(Collection::ClinicInfo, query).await?)
    }

    pub async fn get(&self, clinic_type: ClinicType) -> Result<ClinicInfo, ContentError> {
        self.find(clinic_type)
            .await?
            .ok_or(ContentError::NotFound("Clinic info"))
    }

    /// Update the clinic's page, creating it on first save.
    pub async fn upsert(
        &self,
        clinic_type: ClinicType,
        request: UpdateClinicInfoRequest,
    ) -> Result<ClinicInfo, ContentError> {
        if !clinic_type.is_concrete() {
            return Err(ContentError::ValidationError(
                "Clinic info belongs to a single clinic".to_string(),
            ));
        }

        let patch = serde_json::to_value(&request).map_err(StoreError::from)?;

        let info = match self.find(clinic_type).await? {
            Some(existing) => {
                self.db
                    .patch(Collection::ClinicInfo, existing.id, &patch)
                    .await?
            }
            None => {
                let mut fields = patch;
                if let Value::Object(map) = &mut fields {
                    map.insert("clinic_type".to_string(), Value::from(clinic_type.as_str()));
                }
                let fields: ClinicInfoFields = serde_json::from_value(fields).map_err(StoreError::from)?;
                self.db.create(Collection::ClinicInfo, &fields).await?
            }
        };

        info!("Clinic info saved for {}", clinic_type);
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn upsert_creates_then_merges() {
        let service = ClinicInfoService::new(&Database::memory());

        let created = service
            .upsert(
                ClinicType::LeanLife,
                UpdateClinicInfoRequest {
                    doctor_name: Some("Dr. Meera".to_string()),
                    address: Some("12 MG Road".to_string()),
                    ..UpdateClinicInfoRequest::default()
                },
            )
            .await
            .unwrap();

        let updated = service
            .upsert(
                ClinicType::LeanLife,
                UpdateClinicInfoRequest {
                    phone: Some("+919123456780".to_string()),
                    ..UpdateClinicInfoRequest::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.doctor_name.as_deref(), Some("Dr. Meera"));
        assert_eq!(updated.phone.as_deref(), Some("+919123456780"));
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_clinic_page_is_not_found() {
        let service = ClinicInfoService::new(&Database::memory());

        assert_matches!(
            service.get(ClinicType::Homeopathy).await,
            Err(ContentError::NotFound("Clinic info"))
        );
        assert_matches!(
            service.upsert(ClinicType::Both, UpdateClinicInfoRequest::default()).await,
            Err(ContentError::ValidationError(_))
        );
    }
}
