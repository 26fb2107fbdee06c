use brandvis_core::TemplateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("prompt template error: {0}")]
    Template(#[from] TemplateError),

    #[error("no discovery prompts could be generated for seed keyword \"{seed}\"")]
    NoPrompts { seed: String },
}
