//! Concurrent two-provider visibility evaluation.

use brandvis_llm::{Gateways, ProviderGateway};
use futures::stream::{self, StreamExt};

use crate::expansion::Prompt;
use crate::matcher::BrandMatcher;
use crate::report::{distinct, rank_by_frequency, PromptEvaluation, VisibilityReport, TOP_BRANDS};

/// Asks both providers every prompt and scores the target brand.
///
/// Both provider calls for one prompt run together, so a prompt costs the
/// slower provider's latency rather than the sum. Prompts run concurrently
/// up to `concurrency`; provider-level limits still apply underneath.
#[derive(Debug, Clone)]
pub struct VisibilityEvaluator {
    openai: ProviderGateway,
    gemini: ProviderGateway,
    matcher: BrandMatcher,
    system: String,
    concurrency: usize,
}

impl VisibilityEvaluator {
    /// `system` is the instruction sent with every discovery prompt.
    /// A `concurrency` of zero is treated as one.
    #[must_use]
    pub fn new(
        gateways: Gateways,
        matcher: BrandMatcher,
        system: String,
        concurrency: usize,
    ) -> Self {
        Self {
            openai: gateways.openai,
            gemini: gateways.gemini,
            matcher,
            system,
            concurrency: concurrency.max(1),
        }
    }

    /// Evaluate every prompt against `brand`.
    ///
    /// `on_progress` fires once per finished prompt, in completion order.
    /// Details come back in the order of `prompts`.
    pub async fn evaluate(
        &self,
        prompts: &[Prompt],
        brand: &str,
        on_progress: &(dyn Fn() + Sync),
    ) -> VisibilityReport {
        // Iterate indices so the closure takes no borrowed argument; a
        // borrowed argument makes the future fail the `Send` check for
        // `tokio::spawn` (higher-ranked lifetime inference limitation).
        let mut finished = stream::iter(0..prompts.len())
            .map(|index| async move {
                let prompt = &prompts[index];
                let evaluation = self.evaluate_prompt(prompt, brand).await;
                on_progress();
                (index, evaluation)
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        finished.sort_by_key(|(index, _)| *index);
        let report =
            VisibilityReport::from_evaluations(finished.into_iter().map(|(_, e)| e).collect());

        tracing::info!(
            brand,
            total_prompts = report.total_prompts,
            appeared = report.appeared,
            no_signal = report.no_signal_prompts,
            visibility = report.visibility_percentage,
            "keyword evaluation finished"
        );
        report
    }

    /// Ask both providers one prompt and score the replies.
    pub async fn evaluate_prompt(&self, prompt: &Prompt, brand: &str) -> PromptEvaluation {
        let (openai_brands, gemini_brands) = tokio::join!(
            self.openai.query(&prompt.text, &self.system),
            self.gemini.query(&prompt.text, &self.system)
        );

        let found_in_openai = self.matcher.is_visible(brand, &openai_brands);
        let found_in_gemini = self.matcher.is_visible(brand, &gemini_brands);
        let no_signal = openai_brands.is_empty() && gemini_brands.is_empty();

        // A provider repeating a name still counts as one mention.
        let top_3_brands = rank_by_frequency(
            distinct(&openai_brands).chain(distinct(&gemini_brands)),
            TOP_BRANDS,
        );

        if no_signal {
            tracing::debug!(
                keyword = %prompt.keyword,
                prompt = %prompt.text,
                "no provider returned any names; prompt excluded from visibility"
            );
        }

        PromptEvaluation {
            prompt: prompt.text.clone(),
            semantic_keyword: prompt.keyword.clone(),
            brand_found: found_in_openai || found_in_gemini,
            found_in_openai,
            found_in_gemini,
            no_signal,
            top_3_brands,
            openai_brands,
            gemini_brands,
        }
    }
}

#[cfg(test)]
#[path = "evaluator_test.rs"]
mod tests;
