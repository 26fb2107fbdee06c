//! Foreground analysis and prompt refinement commands.
//!
//! Runs the same pipeline as the server without a job table: progress goes to
//! stderr, the report to stdout, and the run record to the configured store
//! unless `--no-save` is given.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use brandvis_core::{AnalysisRequest, AppConfig};
use brandvis_db::{LogRunStore, PgRunStore, RunStore};
use brandvis_llm::Gateways;
use brandvis_visibility::{AnalysisPipeline, AnalysisReport, KeywordExpander};
use clap::Args;

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Requester address stored with the run
    #[arg(long)]
    pub email: String,
    /// Seed keyword to expand
    #[arg(long)]
    pub seed: String,
    /// Brand to look for in provider answers
    #[arg(long)]
    pub brand: String,
    /// Market the discovery prompts target (e.g., US)
    #[arg(long)]
    pub market: String,
    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
    /// Skip writing the run record
    #[arg(long)]
    pub no_save: bool,
}

impl AnalyzeArgs {
    fn request(&self) -> AnalysisRequest {
        AnalysisRequest {
            email: self.email.clone(),
            seed_keyword: self.seed.clone(),
            brand: self.brand.clone(),
            market: self.market.clone(),
        }
    }
}

/// # Errors
///
/// Returns an error on invalid input, template or client construction
/// failure, or when no discovery prompts could be generated. Provider
/// failures are not errors; they shrink the report instead.
pub(crate) async fn run_analyze(config: &AppConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let request = args.request().normalized()?;

    let templates = Arc::new(brandvis_core::load_templates(
        config.templates_path.as_deref(),
    )?);
    let gateways = Gateways::from_config(config)?;
    let pipeline = AnalysisPipeline::from_config(config, gateways, templates)?;

    let total = pipeline.total_steps();
    let done = AtomicUsize::new(0);
    let on_progress = || {
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        eprintln!("[{n}/{total}] prompts evaluated");
    };

    let report = pipeline.run(&request, &on_progress).await?;

    if args.no_save {
        tracing::info!("--no-save given; run record not written");
    } else {
        let store = open_store(config).await;
        if let Err(e) = store.record(&report.run_record()).await {
            tracing::warn!(store = store.kind(), error = %e, "failed to save run record");
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

/// # Errors
///
/// Returns an error on template or client construction failure, or when the
/// provider returns no rewrite.
pub(crate) async fn run_refine(
    config: &AppConfig,
    prompt: &str,
    market: &str,
) -> anyhow::Result<()> {
    let templates = Arc::new(brandvis_core::load_templates(
        config.templates_path.as_deref(),
    )?);
    let gateways = Gateways::from_config(config)?;
    let expander = KeywordExpander::new(gateways.openai, templates, 0, 0);

    match expander.refine_prompt(prompt, market).await? {
        Some(refined) => println!("{refined}"),
        None => anyhow::bail!("provider returned no rewrite for \"{prompt}\""),
    }
    Ok(())
}

/// Falls back to the log store when the database is unset or unreachable.
async fn open_store(config: &AppConfig) -> Box<dyn RunStore> {
    if config.database_url.is_none() {
        return Box::new(LogRunStore);
    }
    match brandvis_db::connect_pool_from_config(config).await {
        Ok(pool) => Box::new(PgRunStore::new(pool)),
        Err(e) => {
            tracing::warn!(error = %e, "database unavailable; logging run record instead");
            Box::new(LogRunStore)
        }
    }
}

pub(crate) fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} in {} for \"{}\"",
        report.brand, report.market, report.seed_keyword
    );
    let _ = writeln!(
        out,
        "visibility: {:.2}% ({} of {} prompts, {} without signal)",
        report.visibility_percentage,
        report.appeared,
        report.total_prompts,
        report.no_signal_prompts
    );
    let top = if report.top_3_brands.is_empty() {
        "\u{2014}".to_string()
    } else {
        report.top_3_brands.join(", ")
    };
    let _ = writeln!(out, "top brands: {top}");
    for keyword in &report.keywords {
        let _ = writeln!(
            out,
            "  {}: {:.2}% ({}/{})",
            keyword.semantic_keyword,
            keyword.report.visibility_percentage,
            keyword.report.appeared,
            keyword.report.total_prompts
        );
    }
    out
}
