pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    CatalogConfig, CatalogProvider, Config, EndpointConfig, HttpConfig, LimitsConfig, PreferencesConfig,
    TimingConfig,
};
pub use credentials::CredentialStore;
pub use paths::{base_path_override, PathManager};
