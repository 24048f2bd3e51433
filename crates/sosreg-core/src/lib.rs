pub mod app_config;
pub mod config;
pub mod entity;
pub mod jurisdiction;
pub mod jurisdictions;
pub mod registry;
pub mod selector;

use thiserror::Error;

pub use app_config::AppConfig;
pub use entity::{DetailRecord, Filing, Officer, ScrapedEntity};
pub use jurisdiction::{
    ApiSpec, CaptchaSpec, DetailPageSelectors, EntityField, FieldMapping, FormField,
    JurisdictionConfig, ScrapeSpec, SearchResultSelectors, SubListSelectors, SubmitMethod, Tier,
};
pub use registry::JurisdictionRegistry;
pub use selector::{SelectorStrategy, ValueTransform};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration for jurisdiction \"{0}\"")]
    UnknownJurisdiction(String),

    #[error("invalid configuration for {code}: {violations:?}")]
    InvalidJurisdiction {
        code: String,
        violations: Vec<String>,
    },

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
