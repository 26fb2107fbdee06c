//! Brand visibility scoring.
//!
//! Expands a seed keyword into related keywords and discovery prompts, asks
//! both providers every prompt concurrently, fuzzy-matches the target brand in
//! their replies, and rolls the results up into keyword and overall reports.

pub mod error;
pub mod evaluator;
pub mod expansion;
pub mod matcher;
pub mod pipeline;
pub mod report;

#[cfg(test)]
mod testing;

pub use error::PipelineError;
pub use evaluator::VisibilityEvaluator;
pub use expansion::{KeywordExpander, Prompt};
pub use matcher::{similarity, BrandMatcher, DEFAULT_SIMILARITY_THRESHOLD};
pub use pipeline::{AnalysisPipeline, PipelineSettings};
pub use report::{
    percentage, AnalysisReport, KeywordVisibility, PromptEvaluation, VisibilityReport,
};
