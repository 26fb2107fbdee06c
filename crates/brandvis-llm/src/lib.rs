//! LLM provider gateway.
//!
//! Thin `reqwest` clients for the OpenAI Responses API and Gemini
//! `generateContent`, wrapped in a [`ProviderGateway`] that enforces
//! process-wide concurrency/spacing limits, retries transient failures, and
//! turns every failure into an empty result so one unhealthy provider never
//! aborts an analysis.

pub mod error;
pub mod gate;
pub mod gateway;
pub mod gemini;
pub mod normalize;
pub mod openai;
pub mod provider;

mod retry;

pub use error::{ProviderError, ProviderErrorKind};
pub use gate::ProviderGate;
pub use gateway::{Gateways, ProviderGateway, RetryPolicy};
pub use gemini::GeminiClient;
pub use normalize::parse_lines;
pub use openai::OpenAiClient;
pub use provider::LlmProvider;
