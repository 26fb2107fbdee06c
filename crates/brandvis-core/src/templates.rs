//! Versioned catalog of the system/user instruction templates sent to the
//! LLM providers.
//!
//! Templates are plain text with `{placeholder}` tokens. The built-in catalog
//! can be overridden entry-by-entry from a YAML file:
//!
//! ```yaml
//! version: "2025-06-a"
//! templates:
//!   visibility.system: |
//!     You are a neutral market analyst.
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::ConfigError;

pub const SEMANTIC_EXPANSION_SYSTEM: &str = "semantic_expansion.system";
pub const SEMANTIC_EXPANSION_USER: &str = "semantic_expansion.user";
pub const PROMPT_GENERATION_SYSTEM: &str = "prompt_generation.system";
pub const PROMPT_GENERATION_USER: &str = "prompt_generation.user";
pub const VISIBILITY_SYSTEM: &str = "visibility.system";
pub const PROMPT_REFINEMENT_SYSTEM: &str = "prompt_refinement.system";
pub const PROMPT_REFINEMENT_USER: &str = "prompt_refinement.user";

/// Every template the pipeline renders. A catalog missing any of these is rejected.
pub const REQUIRED_TEMPLATES: &[&str] = &[
    SEMANTIC_EXPANSION_SYSTEM,
    SEMANTIC_EXPANSION_USER,
    PROMPT_GENERATION_SYSTEM,
    PROMPT_GENERATION_USER,
    VISIBILITY_SYSTEM,
    PROMPT_REFINEMENT_SYSTEM,
    PROMPT_REFINEMENT_USER,
];

const BUILTIN_VERSION: &str = "builtin-1";

const BUILTIN_SEMANTIC_EXPANSION_SYSTEM: &str = "\
You are an expert in user search behavior and intent analysis.

Your task is to expand a seed keyword into semantically related
keywords that users might naturally search for.

Rules:
- Return only keyword phrases
- One keyword per line
- Do NOT include explanations
- Do NOT include numbering or bullets
";

const BUILTIN_SEMANTIC_EXPANSION_USER: &str = "\
You are a Marketing Strategist.

Expand the seed keyword \"{seed}\" into exactly {count} keyword phrases
that represent the same or closely related service intent.

IMPORTANT RULES:
- The FIRST keyword MUST be the seed keyword itself: \"{seed}\"
- The remaining keywords should be semantically related services
  or alternative ways users search for the same solution
- One keyword per line
- Do NOT include explanations, numbering, or bullets
";

const BUILTIN_PROMPT_GENERATION_SYSTEM: &str = "\
You are an expert in user search behavior.

Your task is to generate natural user queries that people ask
when they want to discover top brands, companies, tools,
or platforms for a given service.

Rules:
- Avoid repeating phrasing or sentence structure
- Generate discovery-focused queries
- Each query must be 5-8 words
- Do NOT include brand names
- Do NOT number the list
- Do NOT include explanations
- One query per line
";

const BUILTIN_PROMPT_GENERATION_USER: &str = "\
You are a Marketing Strategist.

Your goal is to take a seed keyword and expand it into multiple
short search prompts that reflect how different types of users
may discover a brand through AI or search engines.

Objective:
- Study the given seed keyword
- Generate {count} short, natural user search queries
- Each query should reflect a different discovery intent
- Queries must sound like real human searches

Context:
- Seed keyword / service: \"{keyword}\"
- Target market: \"{market}\"
";

const BUILTIN_VISIBILITY_SYSTEM: &str = "\
You are a neutral market analyst.

Your task is to answer user queries by listing
well-known brands, companies, or tools relevant to the query.

Rules:
- Respond ONLY with a simple list of names
- One brand per line
- Do NOT include descriptions or explanations
- Do NOT include introductory or concluding text
- Do NOT rank unless explicitly asked
- Be factual and neutral
";

const BUILTIN_PROMPT_REFINEMENT_SYSTEM: &str = "\
You are a Marketing Strategist specializing in AI search behavior.

Your task is to OUTPUT ONLY ONE expanded discovery-style query.

ABSOLUTE RULES:
- Output must be a SINGLE natural search / AI query
- Do NOT write instructions, requests, or commands
- Do NOT use \"please\", \"can you\", \"help\", \"provide\", \"explain\"
- Do NOT use first-person language (\"I\", \"we\", \"my\")
- Do NOT mention brands
- Do NOT add introductions or conclusions
- The output must start directly as a query, not a sentence to someone
- The output must be suitable for copy-paste into an AI search box

If the output sounds instructional, it is WRONG.
";

const BUILTIN_PROMPT_REFINEMENT_USER: &str = "\
Base query: \"{prompt}\"
Target market: {market}

Rewrite this as ONE natural, high-intent discovery query
focused on comparison and evaluation.
";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("template {template} references unresolved placeholder {{{placeholder}}}")]
    UnresolvedPlaceholder {
        template: String,
        placeholder: String,
    },
}

/// Named instruction templates plus the catalog version they came from.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    version: String,
    templates: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct TemplatesFile {
    version: String,
    #[serde(default)]
    templates: BTreeMap<String, String>,
}

impl PromptTemplates {
    /// The catalog compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        let templates = [
            (SEMANTIC_EXPANSION_SYSTEM, BUILTIN_SEMANTIC_EXPANSION_SYSTEM),
            (SEMANTIC_EXPANSION_USER, BUILTIN_SEMANTIC_EXPANSION_USER),
            (PROMPT_GENERATION_SYSTEM, BUILTIN_PROMPT_GENERATION_SYSTEM),
            (PROMPT_GENERATION_USER, BUILTIN_PROMPT_GENERATION_USER),
            (VISIBILITY_SYSTEM, BUILTIN_VISIBILITY_SYSTEM),
            (PROMPT_REFINEMENT_SYSTEM, BUILTIN_PROMPT_REFINEMENT_SYSTEM),
            (PROMPT_REFINEMENT_USER, BUILTIN_PROMPT_REFINEMENT_USER),
        ]
        .into_iter()
        .map(|(name, text)| (name.to_string(), text.to_string()))
        .collect();

        Self {
            version: BUILTIN_VERSION.to_string(),
            templates,
        }
    }

    /// Parse a YAML catalog and layer it over the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TemplatesFileParse`] for invalid YAML and
    /// [`ConfigError::Validation`] when the merged catalog is incomplete.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let file: TemplatesFile = serde_yaml::from_str(content)?;
        if file.version.trim().is_empty() {
            return Err(ConfigError::Validation(
                "templates file version must be non-empty".to_string(),
            ));
        }

        let mut merged = Self::builtin();
        merged.version = file.version;
        merged.templates.extend(file.templates);
        merged.validate()?;
        Ok(merged)
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Names of every template in the catalog, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Raw template text, without placeholder substitution.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Render `name`, substituting each `{key}` with its value from `vars`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownTemplate`] if `name` is not in the
    /// catalog, or [`TemplateError::UnresolvedPlaceholder`] if the template
    /// references a key missing from `vars`.
    pub fn render(&self, name: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
        let template = self
            .get(name)
            .ok_or_else(|| TemplateError::UnknownTemplate(name.to_string()))?;

        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                rest = "";
                break;
            };
            let key = &after[..close];
            if is_placeholder_key(key) {
                let value = vars
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| *v)
                    .ok_or_else(|| TemplateError::UnresolvedPlaceholder {
                        template: name.to_string(),
                        placeholder: key.to_string(),
                    })?;
                out.push_str(value);
            } else {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for name in REQUIRED_TEMPLATES {
            match self.templates.get(*name) {
                Some(text) if !text.trim().is_empty() => {}
                Some(_) => {
                    return Err(ConfigError::Validation(format!(
                        "template '{name}' must be non-empty"
                    )))
                }
                None => {
                    return Err(ConfigError::Validation(format!(
                        "missing required template '{name}'"
                    )))
                }
            }
        }
        Ok(())
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self::builtin()
    }
}

fn is_placeholder_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}

/// Load the template catalog, falling back to the built-in one when no path is configured.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_templates(path: Option<&Path>) -> Result<PromptTemplates, ConfigError> {
    let Some(path) = path else {
        return Ok(PromptTemplates::builtin());
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TemplatesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    PromptTemplates::from_yaml(&content)
}
