use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use shared_database::{Collection, Database, ListQuery, StoreError};
use shared_utils::password::{hash_secret, verify_secret};

use crate::models::{
    AdminSettings, AdminSettingsFields, AuthError, ContactNumbers, UpdateSettingsRequest,
};

/// Reads and writes the single admin settings row.
pub struct SettingsService {
    db: Database,
}

impl SettingsService {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    pub async fn load(&self) -> Result<Option<AdminSettings>, AuthError> {
        let query = ListQuery::new().order_asc("created_at");
        Ok(self.db.find_first(Collection::AdminSettings, query).await?)
    }

    /// Check the admin password. When no password is stored yet, `bootstrap`
    /// (from the environment) is hashed and saved first.
    #[instrument(skip(self, password, bootstrap))]
    pub async fn verify_admin(&self, password: &str, bootstrap: Option<&str>) -> Result<(), AuthError> {
        if password.is_empty() {
            return Err(AuthError::ValidationError("Enter password".to_string()));
        }

        let hash = match self.load().await?.and_then(|s| s.data.admin_password_hash) {
            Some(hash) => hash,
            None => self.bootstrap_password(bootstrap).await?,
        };

        if verify_secret(password, &hash) {
            info!("Admin signed in");
            Ok(())
        } else {
            warn!("Admin login rejected");
            Err(AuthError::IncorrectPassword)
        }
    }

    pub async fn update(&self, request: UpdateSettingsRequest) -> Result<AdminSettings, AuthError> {
        let mut patch = Map::new();

        if let Some(password) = request.admin_password.as_deref().map(str::trim) {
            if !password.is_empty() {
                let hash = hash_secret(password).map_err(|e| AuthError::Hashing(e.to_string()))?;
                patch.insert("admin_password_hash".to_string(), Value::String(hash));
            }
        }
        for (field, value) in [
            ("homeopathy_whatsapp", request.homeopathy_whatsapp),
            ("leanlife_whatsapp", request.leanlife_whatsapp),
        ] {
            if let Some(value) = value {
                let value = value.trim().to_string();
                let value = if value.is_empty() { Value::Null } else { Value::String(value) };
                patch.insert(field.to_string(), value);
            }
        }

        debug!("Updating settings fields: {:?}", patch.keys().collect::<Vec<_>>());
        self.write(Value::Object(patch)).await
    }

    pub async fn contact(&self) -> Result<ContactNumbers, AuthError> {
        Ok(match self.load().await? {
            Some(settings) => ContactNumbers {
                homeopathy_whatsapp: settings.data.homeopathy_whatsapp,
                leanlife_whatsapp: settings.data.leanlife_whatsapp,
            },
            None => ContactNumbers::default(),
        })
    }

    async fn bootstrap_password(&self, bootstrap: Option<&str>) -> Result<String, AuthError> {
        let password = bootstrap
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(AuthError::NotConfigured)?;

        let hash = hash_secret(password).map_err(|e| AuthError::Hashing(e.to_string()))?;
        let mut patch = Map::new();
        patch.insert("admin_password_hash".to_string(), Value::String(hash.clone()));
        self.write(Value::Object(patch)).await?;

        info!("Admin password initialised from ADMIN_BOOTSTRAP_PASSWORD");
        Ok(hash)
    }

    /// Merge `patch` into the settings row, creating it on first write.
    async fn write(&self, patch: Value) -> Result<AdminSettings, AuthError> {
        match self.load().await? {
            Some(existing) => Ok(self
                .db
                .patch(Collection::AdminSettings, existing.id, &patch)
                .await?),
            None => {
                let fields: AdminSettingsFields =
                    serde_json::from_value(patch).map_err(StoreError::from)?;
                Ok(self.db.create(Collection::AdminSettings, &fields).await?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn bootstrap_password_seeds_settings_once() {
        let service = SettingsService::new(&Database::memory());

        service.verify_admin("clinic-admin", Some("clinic-admin")).await.unwrap();

        let stored = service.load().await.unwrap().unwrap();
        let hash = stored.admin_password_hash.clone().unwrap();
        assert_ne!(hash, "clinic-admin");

        // The stored hash wins over a changed bootstrap value.
        service.verify_admin("clinic-admin", Some("something-else")).await.unwrap();
        assert_matches!(
            service.verify_admin("something-else", Some("something-else")).await,
            Err(AuthError::IncorrectPassword)
        );
    }

    #[tokio::test]
    async fn no_password_anywhere_is_not_configured() {
        let service = SettingsService::new(&Database::memory());

        assert_matches!(
            service.verify_admin("anything", None).await,
            Err(AuthError::NotConfigured)
        );
    }

    #[tokio::test]
    async fn empty_password_is_rejected_before_lookup() {
        let service = SettingsService::new(&Database::memory());

        assert_matches!(
            service.verify_admin("", Some("clinic-admin")).await,
            Err(AuthError::ValidationError(msg)) if msg == "Enter password"
        );
    }

    #[tokio::test]
    async fn update_hashes_password_and_sets_contacts() {
        let service = SettingsService::new(&Database::memory());

        let settings = service
            .update(UpdateSettingsRequest {
                admin_password: Some("new-pass".to_string()),
                homeopathy_whatsapp: Some("+919876543210".to_string()),
                leanlife_whatsapp: None,
            })
            .await
            .unwrap();

        assert!(verify_secret("new-pass", settings.admin_password_hash.as_deref().unwrap()));
        service.verify_admin("new-pass", None).await.unwrap();

        service
            .update(UpdateSettingsRequest {
                leanlife_whatsapp: Some("+919123456780".to_string()),
                homeopathy_whatsapp: Some("  ".to_string()),
                ..UpdateSettingsRequest::default()
            })
            .await
            .unwrap();

        assert_eq!(
            service.contact().await.unwrap(),
            ContactNumbers {
                homeopathy_whatsapp: None,
                leanlife_whatsapp: Some("+919123456780".to_string()),
            }
        );
    }
}
