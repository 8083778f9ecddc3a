use std::env;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which `DocumentStore` implementation backs the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Supabase,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(StoreBackend::Supabase),
            "memory" | "in_memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_api_key: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub store_backend: StoreBackend,
    pub store_timeout_secs: u64,
    pub onesignal_app_id: String,
    pub onesignal_api_key: String,
    pub onesignal_base_url: String,
    pub broadcast_concurrency: usize,
    pub admin_bootstrap_password: Option<String>,
    pub clinic_utc_offset_minutes: i32,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_api_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            session_secret: env::var("SESSION_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SESSION_SECRET not set, using empty value");
                    String::new()
                }),
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 24 * 30),
            store_backend: parse_or("STORE_BACKEND", StoreBackend::Supabase),
            store_timeout_secs: parse_or("STORE_TIMEOUT_SECS", 10),
            onesignal_app_id: env::var("ONESIGNAL_APP_ID")
                .unwrap_or_else(|_| {
                    warn!("ONESIGNAL_APP_ID not set, push notifications disabled");
                    String::new()
                }),
            onesignal_api_key: env::var("ONESIGNAL_API_KEY").unwrap_or_default(),
            onesignal_base_url: env::var("ONESIGNAL_BASE_URL")
                .unwrap_or_else(|_| "https://api.onesignal.com".to_string()),
            broadcast_concurrency: parse_or("BROADCAST_CONCURRENCY", 8),
            admin_bootstrap_password: env::var("ADMIN_BOOTSTRAP_PASSWORD")
                .ok()
                .filter(|value| !value.is_empty()),
            clinic_utc_offset_minutes: parse_or("CLINIC_UTC_OFFSET_MINUTES", 330),
            port: parse_or("PORT", 3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        let store_ready = match self.store_backend {
            StoreBackend::Supabase => {
                !self.supabase_url.is_empty() && !self.supabase_api_key.is_empty()
            }
            StoreBackend::Memory => true,
        };

        store_ready && !self.session_secret.is_empty()
    }

    pub fn is_push_configured(&self) -> bool {
        !self.onesignal_app_id.is_empty()
            && !self.onesignal_api_key.is_empty()
            && !self.onesignal_base_url.is_empty()
    }

    /// Calendar date at the clinic, used for "today" statistics and upcoming lists.
    pub fn clinic_today(&self) -> NaiveDate {
        let now = Utc::now();
        match FixedOffset::east_opt(self.clinic_utc_offset_minutes * 60) {
            Some(offset) => now.with_timezone(&offset).date_naive(),
            None => now.date_naive(),
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value ({}), using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_known_names() {
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!(" Supabase ".parse::<StoreBackend>(), Ok(StoreBackend::Supabase));
        assert!("mongo".parse::<StoreBackend>().is_err());
    }
}
