use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read templates file {path}: {source}")]
    TemplatesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse templates file: {0}")]
    TemplatesFileParse(#[from] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
