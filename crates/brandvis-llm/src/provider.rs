use futures::future::BoxFuture;

use crate::error::ProviderError;

/// One external LLM backend that turns a system instruction plus a user
/// prompt into free text.
pub trait LlmProvider: Send + Sync {
    /// Short provider name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Send one completion request and return the raw reply text.
    fn complete<'a>(
        &'a self,
        system: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>>;
}
