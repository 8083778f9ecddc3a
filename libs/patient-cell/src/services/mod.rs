pub mod identity;
pub mod patient;

pub use identity::IdentityResolver;
pub use patient::PatientService;
