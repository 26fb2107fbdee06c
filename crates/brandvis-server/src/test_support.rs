//! Scripted providers for the server's unit tests.

use std::sync::Arc;
use std::time::Duration;

use brandvis_llm::{
    Gateways, LlmProvider, ProviderError, ProviderGate, ProviderGateway, RetryPolicy,
};
use futures::future::BoxFuture;

type Reply = dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync;

pub(crate) struct FakeProvider {
    name: &'static str,
    delay: Duration,
    reply: Box<Reply>,
}

impl FakeProvider {
    pub(crate) fn new(
        name: &'static str,
        reply: impl Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            delay: Duration::ZERO,
            reply: Box::new(reply),
        }
    }

    pub(crate) fn text(name: &'static str, text: &'static str) -> Self {
        Self::new(name, move |_| Ok(text.to_owned()))
    }

    /// Expands to two keywords with five prompts each, then names Acme on
    /// every visibility prompt.
    pub(crate) fn cooperative() -> Self {
        Self::new("openai", |prompt| {
            Ok(if prompt.contains("Expand the seed keyword") {
                "crm\ncustomer relationship tools".to_owned()
            } else if prompt.contains("Generate 5 short") {
                "q1\nq2\nq3\nq4\nq5".to_owned()
            } else {
                "Acme\nHubSpot".to_owned()
            })
        })
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl LlmProvider for FakeProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn complete<'a>(
        &'a self,
        _system: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.reply)(prompt)
        })
    }
}

fn gateway(provider: FakeProvider) -> ProviderGateway {
    ProviderGateway::new(
        Arc::new(provider) as Arc<dyn LlmProvider>,
        ProviderGate::new(16),
        RetryPolicy::none(),
    )
}

pub(crate) fn gateways(openai: FakeProvider, gemini: FakeProvider) -> Gateways {
    Gateways {
        openai: gateway(openai),
        gemini: gateway(gemini),
    }
}
