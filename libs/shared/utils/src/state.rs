use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::Database;

/// Shared router state: configuration plus the deployment's store.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let db = Database::from_config(&config);
        Self::with_database(config, db)
    }

    pub fn with_database(config: AppConfig, db: Database) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }
}
