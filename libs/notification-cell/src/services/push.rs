use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::NotificationError;

/// Delivers a push message to one device subscription.
#[async_trait]
pub trait PushProvider: Send + Sync {
    fn is_enabled(&self) -> bool;

    async fn send(&self, recipient_token: &str, title: &str, body: &str) -> Result<(), NotificationError>;
}

/// OneSignal REST client.
/// Based on: https://documentation.onesignal.com/reference/push-notification
pub struct OneSignalClient {
    client: Client,
    app_id: String,
    api_key: String,
    base_url: String,
}

impl OneSignalClient {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_push_configured() {
            return Err(NotificationError::Push("OneSignal is not configured".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.store_timeout_secs))
            .build()
            .map_err(|e| NotificationError::Push(e.to_string()))?;

        Ok(Self {
            client,
            app_id: config.onesignal_app_id.clone(),
            api_key: config.onesignal_api_key.clone(),
            base_url: config.onesignal_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PushProvider for OneSignalClient {
    fn is_enabled(&self) -> bool {
        true
    }

    /// POST /notifications
    async fn send(&self, recipient_token: &str, title: &str, body: &str) -> Result<(), NotificationError> {
        let url = format!("{}/notifications", self.base_url);

        let request_body = json!({
            "app_id": self.app_id,
            "include_subscription_ids": [recipient_token],
            "headings": { "en": title },
            "contents": { "en": body },
        });

        debug!("Sending push to OneSignal: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Key {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| NotificationError::Push(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let response_text = response.text().await.unwrap_or_default();
            error!("OneSignal push failed: {} - {}", status, response_text);
            return Err(NotificationError::Push(format!("HTTP {}: {}", status, response_text)));
        }

        debug!("OneSignal accepted push");
        Ok(())
    }
}

/// Used when no push provider is configured. Records are still written; nothing is pushed.
pub struct DisabledPush;

#[async_trait]
impl PushProvider for DisabledPush {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn send(&self, _recipient_token: &str, _title: &str, _body: &str) -> Result<(), NotificationError> {
        Ok(())
    }
}

pub fn provider_from_config(config: &AppConfig) -> Arc<dyn PushProvider> {
    match OneSignalClient::new(config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            info!("Push notifications disabled: {}", e);
            Arc::new(DisabledPush)
        }
    }
}
