pub mod session;
pub mod settings;

pub use session::SessionIssuer;
pub use settings::SettingsService;
