//! Full analysis: expand → generate → evaluate → aggregate.

use std::sync::Arc;

use brandvis_core::templates::VISIBILITY_SYSTEM;
use brandvis_core::{AnalysisRequest, AppConfig, PromptTemplates};
use brandvis_llm::Gateways;

use crate::error::PipelineError;
use crate::evaluator::VisibilityEvaluator;
use crate::expansion::{KeywordExpander, Prompt};
use crate::matcher::{BrandMatcher, DEFAULT_SIMILARITY_THRESHOLD};
use crate::report::{AnalysisReport, KeywordVisibility};

/// Knobs for one analysis, normally taken from [`AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub related_keywords: usize,
    pub prompts_per_keyword: usize,
    pub prompt_concurrency: usize,
    pub similarity_threshold: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            related_keywords: 1,
            prompts_per_keyword: 5,
            prompt_concurrency: 4,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            related_keywords: config.related_keywords,
            prompts_per_keyword: config.prompts_per_keyword,
            prompt_concurrency: config.prompt_concurrency,
            similarity_threshold: config.similarity_threshold,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    expander: KeywordExpander,
    evaluator: VisibilityEvaluator,
    settings: PipelineSettings,
}

impl AnalysisPipeline {
    /// # Errors
    ///
    /// Returns [`PipelineError::Template`] if the visibility instruction does not render.
    pub fn new(
        gateways: Gateways,
        templates: Arc<PromptTemplates>,
        settings: PipelineSettings,
    ) -> Result<Self, PipelineError> {
        let system = templates.render(VISIBILITY_SYSTEM, &[])?;
        let expander = KeywordExpander::new(
            gateways.openai.clone(),
            templates,
            settings.related_keywords,
            settings.prompts_per_keyword,
        );
        let evaluator = VisibilityEvaluator::new(
            gateways,
            BrandMatcher::new(settings.similarity_threshold),
            system,
            settings.prompt_concurrency,
        );

        Ok(Self {
            expander,
            evaluator,
            settings,
        })
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::Template`] if the visibility instruction does not render.
    pub fn from_config(
        config: &AppConfig,
        gateways: Gateways,
        templates: Arc<PromptTemplates>,
    ) -> Result<Self, PipelineError> {
        Self::new(gateways, templates, PipelineSettings::from_config(config))
    }

    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Upper bound on prompt evaluations, used as a job's progress total.
    ///
    /// The provider may return fewer keywords or prompts, so a run can
    /// finish below this.
    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.settings
            .related_keywords
            .saturating_add(1)
            .saturating_mul(self.settings.prompts_per_keyword)
    }

    /// Run one analysis. `on_progress` fires after every prompt evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoPrompts`] if no keyword produced a single
    /// prompt, or [`PipelineError::Template`] on a template failure.
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        on_progress: &(dyn Fn() + Sync),
    ) -> Result<AnalysisReport, PipelineError> {
        let keywords = self.expander.expand_keywords(&request.seed_keyword).await?;

        let mut planned: Vec<(String, Vec<Prompt>)> = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let prompts = self
                .expander
                .generate_prompts(&keyword, &request.market)
                .await?;
            tracing::debug!(keyword = %keyword, prompts = prompts.len(), "generated prompts");
            planned.push((keyword, prompts));
        }

        if planned.iter().all(|(_, prompts)| prompts.is_empty()) {
            return Err(PipelineError::NoPrompts {
                seed: request.seed_keyword.clone(),
            });
        }

        let mut results = Vec::with_capacity(planned.len());
        for (keyword, prompts) in planned {
            let report = self
                .evaluator
                .evaluate(&prompts, &request.brand, on_progress)
                .await;
            results.push(KeywordVisibility {
                semantic_keyword: keyword,
                report,
            });
        }

        let report = AnalysisReport::aggregate(request, results);
        tracing::info!(
            brand = %report.brand,
            seed = %report.seed_keyword,
            keywords = report.keywords.len(),
            total_prompts = report.total_prompts,
            appeared = report.appeared,
            visibility = report.visibility_percentage,
            "analysis finished"
        );
        Ok(report)
    }
}
