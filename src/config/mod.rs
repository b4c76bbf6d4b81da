pub mod app;
pub mod defaults;
pub mod error;
pub mod loader;
pub mod provider;
pub mod server;

pub use app::{AppConfig, DispatchSettings};
pub use defaults::CONFIG_PATH;
pub use error::ConfigError;
pub use provider::ProviderSettings;
pub use server::RestServerConfig;
