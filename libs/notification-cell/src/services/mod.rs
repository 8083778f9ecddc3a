pub mod dispatcher;
pub mod push;

pub use dispatcher::NotificationDispatcher;
pub use push::{provider_from_config, DisabledPush, OneSignalClient, PushProvider};
