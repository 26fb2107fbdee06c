//! Per-prompt results and their roll-up into keyword and analysis reports.

use std::collections::HashSet;

use brandvis_core::{AnalysisRequest, RunRecord};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// How many competitor names a ranking keeps.
pub const TOP_BRANDS: usize = 3;

/// Outcome of asking both providers one discovery prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEvaluation {
    pub prompt: String,
    pub semantic_keyword: String,
    pub brand_found: bool,
    pub found_in_openai: bool,
    pub found_in_gemini: bool,
    /// Both providers returned nothing; excluded from the visibility denominator.
    pub no_signal: bool,
    pub top_3_brands: Vec<String>,
    pub openai_brands: Vec<String>,
    pub gemini_brands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityReport {
    /// Prompts that produced a signal from at least one provider.
    pub total_prompts: usize,
    pub appeared: usize,
    pub no_signal_prompts: usize,
    pub visibility_percentage: f64,
    /// Every evaluated prompt in submission order, no-signal ones included.
    pub details: Vec<PromptEvaluation>,
}

impl VisibilityReport {
    #[must_use]
    pub fn from_evaluations(details: Vec<PromptEvaluation>) -> Self {
        let no_signal_prompts = details.iter().filter(|d| d.no_signal).count();
        let total_prompts = details.len() - no_signal_prompts;
        let appeared = details
            .iter()
            .filter(|d| !d.no_signal && d.brand_found)
            .count();

        Self {
            total_prompts,
            appeared,
            no_signal_prompts,
            visibility_percentage: percentage(appeared, total_prompts),
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordVisibility {
    pub semantic_keyword: String,
    pub report: VisibilityReport,
}

/// Final payload of one analysis job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub email: String,
    pub seed_keyword: String,
    pub semantic_keywords: Vec<String>,
    pub brand: String,
    pub market: String,
    pub total_prompts: usize,
    pub appeared: usize,
    pub no_signal_prompts: usize,
    pub visibility_percentage: f64,
    pub top_3_brands: Vec<String>,
    pub keywords: Vec<KeywordVisibility>,
}

impl AnalysisReport {
    /// Roll keyword reports up into the overall figures.
    #[must_use]
    pub fn aggregate(request: &AnalysisRequest, keywords: Vec<KeywordVisibility>) -> Self {
        let total_prompts = keywords.iter().map(|k| k.report.total_prompts).sum();
        let appeared = keywords.iter().map(|k| k.report.appeared).sum();
        let no_signal_prompts = keywords.iter().map(|k| k.report.no_signal_prompts).sum();

        let top_3_brands = rank_by_frequency(
            keywords
                .iter()
                .flat_map(|k| k.report.details.iter())
                .flat_map(|d| d.top_3_brands.iter().map(String::as_str)),
            TOP_BRANDS,
        );

        Self {
            email: request.email.clone(),
            seed_keyword: request.seed_keyword.clone(),
            semantic_keywords: keywords
                .iter()
                .map(|k| k.semantic_keyword.clone())
                .collect(),
            brand: request.brand.clone(),
            market: request.market.clone(),
            total_prompts,
            appeared,
            no_signal_prompts,
            visibility_percentage: percentage(appeared, total_prompts),
            top_3_brands,
            keywords,
        }
    }

    /// The summary persisted for reporting, stamped now.
    #[must_use]
    pub fn run_record(&self) -> RunRecord {
        RunRecord {
            email: self.email.clone(),
            seed_keyword: self.seed_keyword.clone(),
            brand: self.brand.clone(),
            market: self.market.clone(),
            visibility: self.visibility_percentage,
            top_3_brands: self.top_3_brands.clone(),
            created_at: Utc::now(),
        }
    }
}

/// `appeared / total × 100` rounded to two decimals; `0.0` when `total` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(appeared: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = appeared as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Up to `limit` names ranked by occurrence count, ties broken by first appearance.
/// Names in first-seen order with later repeats dropped.
pub(crate) fn distinct(names: &[String]) -> impl Iterator<Item = &str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(String::as_str)
        .filter(move |name| seen.insert(*name))
}

pub(crate) fn rank_by_frequency<'a>(
    names: impl IntoIterator<Item = &'a str>,
    limit: usize,
) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for name in names {
        match counts.iter_mut().find(|(seen, _)| *seen == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(name, _)| name.to_owned())
        .collect()
}
