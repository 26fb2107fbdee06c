//! Seed keyword expansion and discovery-prompt generation.

use std::sync::Arc;

use brandvis_core::templates::{
    PROMPT_GENERATION_SYSTEM, PROMPT_GENERATION_USER, PROMPT_REFINEMENT_SYSTEM,
    PROMPT_REFINEMENT_USER, SEMANTIC_EXPANSION_SYSTEM, SEMANTIC_EXPANSION_USER,
};
use brandvis_core::PromptTemplates;
use brandvis_llm::ProviderGateway;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A discovery prompt and the semantic keyword it was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub keyword: String,
    pub text: String,
}

/// Turns a seed keyword into related keywords and each keyword into prompts,
/// using one provider for the text generation.
#[derive(Debug, Clone)]
pub struct KeywordExpander {
    gateway: ProviderGateway,
    templates: Arc<PromptTemplates>,
    related_keywords: usize,
    prompts_per_keyword: usize,
}

impl KeywordExpander {
    #[must_use]
    pub fn new(
        gateway: ProviderGateway,
        templates: Arc<PromptTemplates>,
        related_keywords: usize,
        prompts_per_keyword: usize,
    ) -> Self {
        Self {
            gateway,
            templates,
            related_keywords,
            prompts_per_keyword,
        }
    }

    /// The seed first, then up to `related_keywords` distinct related phrases.
    ///
    /// Lines repeating the seed (in any case) are skipped. A provider that
    /// returns nothing leaves just the seed.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Template`] if the expansion templates do not render.
    pub async fn expand_keywords(&self, seed: &str) -> Result<Vec<String>, PipelineError> {
        let seed = seed.trim();
        let mut keywords = vec![seed.to_owned()];
        if self.related_keywords == 0 {
            return Ok(keywords);
        }

        let count = self.related_keywords.saturating_add(1).to_string();
        let system = self.templates.render(SEMANTIC_EXPANSION_SYSTEM, &[])?;
        let user = self.templates.render(
            SEMANTIC_EXPANSION_USER,
            &[("seed", seed), ("count", count.as_str())],
        )?;

        for line in self.gateway.query(&user, &system).await {
            if keywords.len() > self.related_keywords {
                break;
            }
            if keywords.iter().any(|k| k.to_lowercase() == line) {
                continue;
            }
            keywords.push(line);
        }

        if keywords.len() == 1 {
            tracing::warn!(seed, "keyword expansion returned no related keywords");
        }
        tracing::debug!(seed, keywords = ?keywords, "expanded seed keyword");
        Ok(keywords)
    }

    /// Up to `prompts_per_keyword` discovery prompts for `keyword` in `market`.
    ///
    /// A short reply is accepted as-is.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Template`] if the generation templates do not render.
    pub async fn generate_prompts(
        &self,
        keyword: &str,
        market: &str,
    ) -> Result<Vec<Prompt>, PipelineError> {
        if self.prompts_per_keyword == 0 {
            return Ok(Vec::new());
        }

        let count = self.prompts_per_keyword.to_string();
        let system = self.templates.render(PROMPT_GENERATION_SYSTEM, &[])?;
        let user = self.templates.render(
            PROMPT_GENERATION_USER,
            &[
                ("keyword", keyword),
                ("market", market),
                ("count", count.as_str()),
            ],
        )?;

        let prompts: Vec<Prompt> = self
            .gateway
            .query(&user, &system)
            .await
            .into_iter()
            .take(self.prompts_per_keyword)
            .map(|text| Prompt {
                keyword: keyword.to_owned(),
                text,
            })
            .collect();

        if prompts.len() < self.prompts_per_keyword {
            tracing::warn!(
                keyword,
                requested = self.prompts_per_keyword,
                generated = prompts.len(),
                "provider returned fewer prompts than requested"
            );
        }
        Ok(prompts)
    }

    /// Rewrite a short discovery prompt as one longer, comparison-focused
    /// query for `market`. Reply lines are joined with single spaces.
    ///
    /// Returns `None` when the provider gives back nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Template`] if the refinement templates do not render.
    pub async fn refine_prompt(
        &self,
        prompt: &str,
        market: &str,
    ) -> Result<Option<String>, PipelineError> {
        let system = self.templates.render(PROMPT_REFINEMENT_SYSTEM, &[])?;
        let user = self.templates.render(
            PROMPT_REFINEMENT_USER,
            &[("prompt", prompt.trim()), ("market", market)],
        )?;

        let refined = self.gateway.query(&user, &system).await.join(" ");
        if refined.is_empty() {
            tracing::warn!(prompt, "prompt refinement returned nothing");
            return Ok(None);
        }
        tracing::debug!(prompt, refined = %refined, "refined discovery prompt");
        Ok(Some(refined))
    }
}

#[cfg(test)]
#[path = "expansion_test.rs"]
mod tests;
