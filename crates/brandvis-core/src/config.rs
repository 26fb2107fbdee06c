use std::fmt::Display;
use std::ops::RangeInclusive;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Upper bound on related keywords generated per seed.
pub const MAX_RELATED_KEYWORDS: usize = 20;
/// Upper bound on discovery prompts generated per keyword.
pub const MAX_PROMPTS_PER_KEYWORD: usize = 50;
/// Upper bound on a single job's deadline (one day).
pub const MAX_JOB_DEADLINE_SECS: u64 = 86_400;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| lookup(var).ok().filter(|v| !v.trim().is_empty());

    let parse_positive = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value: usize = parse_as(var, &or_default(var, default))?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(value)
    };

    let openai_api_key = require("OPENAI_API_KEY")?;
    let gemini_api_key = require("GEMINI_API_KEY")?;

    let env = parse_environment(&or_default("BRANDVIS_ENV", "development"));
    let bind_addr: SocketAddr = parse_as(
        "BRANDVIS_BIND_ADDR",
        &or_default("BRANDVIS_BIND_ADDR", "0.0.0.0:8000"),
    )?;
    let log_level = or_default("BRANDVIS_LOG_LEVEL", "info");
    let database_url = optional("DATABASE_URL");
    let templates_path = optional("BRANDVIS_TEMPLATES_PATH").map(PathBuf::from);

    let openai_model = or_default("OPENAI_MODEL", "gpt-4.1-mini");
    let openai_base_url = or_default("OPENAI_BASE_URL", "https://api.openai.com/v1");
    let gemini_model = or_default("GEMINI_MODEL", "gemini-2.5-flash-lite");
    let gemini_base_url = or_default(
        "GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com/v1beta",
    );

    let provider_timeout_secs: u64 = parse_as(
        "BRANDVIS_PROVIDER_TIMEOUT_SECS",
        &or_default("BRANDVIS_PROVIDER_TIMEOUT_SECS", "60"),
    )?;
    let provider_max_retries: u32 = parse_as(
        "BRANDVIS_PROVIDER_MAX_RETRIES",
        &or_default("BRANDVIS_PROVIDER_MAX_RETRIES", "1"),
    )?;
    let provider_retry_backoff_ms: u64 = parse_as(
        "BRANDVIS_PROVIDER_RETRY_BACKOFF_MS",
        &or_default("BRANDVIS_PROVIDER_RETRY_BACKOFF_MS", "500"),
    )?;
    let openai_max_concurrency = parse_positive("BRANDVIS_OPENAI_MAX_CONCURRENCY", "10")?;
    let gemini_max_concurrency = parse_positive("BRANDVIS_GEMINI_MAX_CONCURRENCY", "3")?;
    let gemini_min_interval_ms: u64 = parse_as(
        "BRANDVIS_GEMINI_MIN_INTERVAL_MS",
        &or_default("BRANDVIS_GEMINI_MIN_INTERVAL_MS", "1500"),
    )?;
    let prompt_concurrency = parse_positive("BRANDVIS_PROMPT_CONCURRENCY", "4")?;
    let related_keywords: usize = parse_as(
        "BRANDVIS_RELATED_KEYWORDS",
        &or_default("BRANDVIS_RELATED_KEYWORDS", "1"),
    )?;
    ensure_within(
        "BRANDVIS_RELATED_KEYWORDS",
        related_keywords,
        0..=MAX_RELATED_KEYWORDS,
    )?;
    let prompts_per_keyword = parse_positive("BRANDVIS_PROMPTS_PER_KEYWORD", "5")?;
    ensure_within(
        "BRANDVIS_PROMPTS_PER_KEYWORD",
        prompts_per_keyword,
        1..=MAX_PROMPTS_PER_KEYWORD,
    )?;

    let similarity_threshold: f64 = parse_as(
        "BRANDVIS_SIMILARITY_THRESHOLD",
        &or_default("BRANDVIS_SIMILARITY_THRESHOLD", "0.85"),
    )?;
    ensure_within(
        "BRANDVIS_SIMILARITY_THRESHOLD",
        similarity_threshold,
        0.0..=1.0,
    )?;

    let job_deadline_secs: u64 = parse_as(
        "BRANDVIS_JOB_DEADLINE_SECS",
        &or_default("BRANDVIS_JOB_DEADLINE_SECS", "900"),
    )?;
    ensure_within(
        "BRANDVIS_JOB_DEADLINE_SECS",
        job_deadline_secs,
        1..=MAX_JOB_DEADLINE_SECS,
    )?;
    let job_retention_secs: u64 = parse_as(
        "BRANDVIS_JOB_RETENTION_SECS",
        &or_default("BRANDVIS_JOB_RETENTION_SECS", "3600"),
    )?;

    let db_max_connections: u32 = parse_as(
        "BRANDVIS_DB_MAX_CONNECTIONS",
        &or_default("BRANDVIS_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "BRANDVIS_DB_MIN_CONNECTIONS",
        &or_default("BRANDVIS_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs: u64 = parse_as(
        "BRANDVIS_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("BRANDVIS_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        database_url,
        templates_path,
        openai_api_key,
        openai_model,
        openai_base_url,
        gemini_api_key,
        gemini_model,
        gemini_base_url,
        provider_timeout_secs,
        provider_max_retries,
        provider_retry_backoff_ms,
        openai_max_concurrency,
        gemini_max_concurrency,
        gemini_min_interval_ms,
        prompt_concurrency,
        related_keywords,
        prompts_per_keyword,
        similarity_threshold,
        job_deadline_secs,
        job_retention_secs,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a raw env-var value, mapping failures to [`ConfigError::InvalidEnvVar`].
fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Reject a parsed value that falls outside `range`.
fn ensure_within<T>(var: &str, value: T, range: RangeInclusive<T>) -> Result<(), ConfigError>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        return Ok(());
    }
    Err(ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: format!(
            "must be within [{}, {}], got {value}",
            range.start(),
            range.end()
        ),
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
