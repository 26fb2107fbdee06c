use thiserror::Error;

/// Failures from a single provider call.
///
/// Every variant is absorbed by [`crate::ProviderGateway`]; nothing here is
/// ever surfaced to the analysis pipeline.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP 429 or a provider-specific quota/exhaustion marker.
    #[error("{provider} quota exhausted: {message}")]
    Quota {
        provider: &'static str,
        message: String,
    },

    /// Transport failure, timeout, or non-success HTTP status.
    #[error("{provider} request failed: {message}")]
    Network {
        provider: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The body was not the JSON shape the provider documents.
    #[error("{provider} returned a malformed response: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },
}

/// Coarse classification used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Quota,
    Network,
    Malformed,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderErrorKind::Quota => write!(f, "quota"),
            ProviderErrorKind::Network => write!(f, "network"),
            ProviderErrorKind::Malformed => write!(f, "malformed"),
        }
    }
}

impl ProviderError {
    #[must_use]
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Quota { .. } => ProviderErrorKind::Quota,
            ProviderError::Network { .. } => ProviderErrorKind::Network,
            ProviderError::Malformed { .. } => ProviderErrorKind::Malformed,
        }
    }

    /// Wrap a transport-level `reqwest` failure.
    pub(crate) fn transport(provider: &'static str, err: &reqwest::Error) -> Self {
        ProviderError::Network {
            provider,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    /// Classify a non-success HTTP response by status and body text.
    pub(crate) fn from_status(provider: &'static str, status: u16, body: &str) -> Self {
        let snippet: String = body.chars().take(200).collect();
        if status == 429 || is_quota_body(body) {
            return ProviderError::Quota {
                provider,
                message: format!("HTTP {status}: {snippet}"),
            };
        }
        ProviderError::Network {
            provider,
            status: Some(status),
            message: format!("HTTP {status}: {snippet}"),
        }
    }
}

fn is_quota_body(body: &str) -> bool {
    body.contains("RESOURCE_EXHAUSTED") || body.contains("insufficient_quota")
}
