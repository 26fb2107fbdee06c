use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_FIELD_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;

/// A request to score one brand's visibility for one seed keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub email: String,
    pub seed_keyword: String,
    pub brand: String,
    pub market: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("email address '{0}' is not valid")]
    InvalidEmail(String),
}

impl AnalysisRequest {
    /// Trim every field and check the request is usable.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking fields in
    /// declaration order.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let email = required("email", &self.email, MAX_EMAIL_LEN)?;
        if !looks_like_email(&email) {
            return Err(ValidationError::InvalidEmail(email));
        }

        Ok(Self {
            email,
            seed_keyword: required("seed_keyword", &self.seed_keyword, MAX_FIELD_LEN)?,
            brand: required("brand", &self.brand, MAX_FIELD_LEN)?,
            market: required("market", &self.market, MAX_FIELD_LEN)?,
        })
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Summary of one completed analysis, written once to the run history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub email: String,
    pub seed_keyword: String,
    pub brand: String,
    pub market: String,
    /// Overall visibility percentage, rounded to two decimals.
    pub visibility: f64,
    pub top_3_brands: Vec<String>,
    pub created_at: DateTime<Utc>,
}
