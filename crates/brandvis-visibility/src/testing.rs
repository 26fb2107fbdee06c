//! Scripted providers shared by this crate's unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use brandvis_llm::{
    Gateways, LlmProvider, ProviderError, ProviderGate, ProviderGateway, RetryPolicy,
};
use futures::future::BoxFuture;

type Reply = dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync;

/// Answers every prompt through `reply` after an optional simulated latency,
/// recording each prompt it was asked.
pub(crate) struct FakeProvider {
    name: &'static str,
    delay: Duration,
    reply: Box<Reply>,
    pub(crate) prompts: Mutex<Vec<String>>,
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
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn text(name: &'static str, text: &'static str) -> Self {
        Self::new(name, move |_| Ok(text.to_owned()))
    }

    pub(crate) fn failing(name: &'static str) -> Self {
        Self::new(name, move |_| {
            Err(ProviderError::Quota {
                provider: name,
                message: "quota exhausted".to_owned(),
            })
        })
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().expect("prompts lock").len()
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
            self.prompts
                .lock()
                .expect("prompts lock")
                .push(prompt.to_owned());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.reply)(prompt)
        })
    }
}

pub(crate) fn gateway(provider: &Arc<FakeProvider>) -> ProviderGateway {
    ProviderGateway::new(
        Arc::clone(provider) as Arc<dyn LlmProvider>,
        ProviderGate::new(16),
        RetryPolicy::none(),
    )
}

pub(crate) fn gateways(openai: &Arc<FakeProvider>, gemini: &Arc<FakeProvider>) -> Gateways {
    Gateways {
        openai: gateway(openai),
        gemini: gateway(gemini),
    }
}
