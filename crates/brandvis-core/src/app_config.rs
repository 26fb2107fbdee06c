use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub database_url: Option<String>,
    pub templates_path: Option<PathBuf>,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub provider_timeout_secs: u64,
    pub provider_max_retries: u32,
    pub provider_retry_backoff_ms: u64,
    pub openai_max_concurrency: usize,
    pub gemini_max_concurrency: usize,
    pub gemini_min_interval_ms: u64,
    pub prompt_concurrency: usize,
    pub related_keywords: usize,
    pub prompts_per_keyword: usize,
    pub similarity_threshold: f64,
    pub job_deadline_secs: u64,
    pub job_retention_secs: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("templates_path", &self.templates_path)
            .field("openai_api_key", &"[redacted]")
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("gemini_api_key", &"[redacted]")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("provider_max_retries", &self.provider_max_retries)
            .field("provider_retry_backoff_ms", &self.provider_retry_backoff_ms)
            .field("openai_max_concurrency", &self.openai_max_concurrency)
            .field("gemini_max_concurrency", &self.gemini_max_concurrency)
            .field("gemini_min_interval_ms", &self.gemini_min_interval_ms)
            .field("prompt_concurrency", &self.prompt_concurrency)
            .field("related_keywords", &self.related_keywords)
            .field("prompts_per_keyword", &self.prompts_per_keyword)
            .field("similarity_threshold", &self.similarity_threshold)
            .field("job_deadline_secs", &self.job_deadline_secs)
            .field("job_retention_secs", &self.job_retention_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
