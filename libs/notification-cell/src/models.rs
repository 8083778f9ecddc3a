use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::{Record, StoreError};
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    General,
    HealthTip,
    Confirmed,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationFields {
    pub patient_id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub is_read: bool,
}

pub type Notification = Record<NotificationFields>;

/// A message waiting to be delivered to one or more patients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub kind: NotificationKind,
}

impl OutgoingMessage {
    pub fn new(title: impl Into<String>, message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub title: String,
    pub message: String,
    pub kind: Option<NotificationKind>,
}

impl From<BroadcastRequest> for OutgoingMessage {
    /// Broadcasts are health tips unless the sender says otherwise.
    fn from(request: BroadcastRequest) -> Self {
        OutgoingMessage::new(
            request.title,
            request.message,
            request.kind.unwrap_or(NotificationKind::HealthTip),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryFailure {
    pub patient_id: Uuid,
    pub reason: String,
}

/// Per-recipient outcome of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub recipients: usize,
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Push provider error: {0}")]
    Push(String),

    #[error("Recipient lookup failed: {0}")]
    Recipients(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound => AppError::NotFound("Notification not found".to_string()),
            NotificationError::ValidationError(msg) => AppError::ValidationError(msg),
            NotificationError::Push(msg) => AppError::ServiceUnavailable(msg),
            NotificationError::Recipients(msg) => AppError::Internal(msg),
            NotificationError::Store(e) => AppError::from(e),
        }
    }
}
