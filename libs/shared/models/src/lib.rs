pub mod auth;
pub mod clinic;
pub mod error;

pub use clinic::ClinicType;
pub use error::AppError;
