use thiserror::Error;

use shared_models::error::AppError;

use crate::query::Collection;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{collection} record {id} not found")]
    NotFound { collection: Collection, id: String },

    #[error("Store unreachable: {0}")]
    Connectivity(String),

    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed record: {0}")]
    Malformed(String),
}

impl StoreError {
    pub fn not_found(collection: Collection, id: impl ToString) -> Self {
        StoreError::NotFound {
            collection,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            StoreError::Rejected {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            StoreError::Connectivity(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, .. } => {
                AppError::NotFound(format!("{} record not found", collection.singular()))
            }
            StoreError::Connectivity(_) => AppError::ServiceUnavailable(
                "Service temporarily unavailable, please try again".to_string(),
            ),
            StoreError::Rejected { status, message } => {
                AppError::Database(format!("Store rejected request ({}): {}", status, message))
            }
            StoreError::Malformed(message) => AppError::Database(message),
        }
    }
}
