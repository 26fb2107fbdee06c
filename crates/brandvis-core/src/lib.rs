//! Shared configuration, prompt templates, and request/record types for the
//! brand visibility service.

pub mod analysis;
pub mod app_config;
pub mod config;
pub mod error;
pub mod templates;

pub use analysis::{AnalysisRequest, RunRecord, ValidationError};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use templates::{load_templates, PromptTemplates, TemplateError};
