pub mod models;
pub mod handlers;
pub mod router;
pub mod services;

pub use models::*;
pub use router::{auth_routes, settings_routes};
