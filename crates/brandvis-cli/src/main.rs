mod analyze;
mod db;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::analyze::AnalyzeArgs;

#[derive(Debug, Parser)]
#[command(name = "brandvis-cli")]
#[command(about = "Brand visibility command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one visibility analysis in the foreground and print the report
    Analyze(AnalyzeArgs),
    /// Rewrite a short discovery prompt as one comparison-focused query
    Refine {
        prompt: String,
        /// Market the query should target (e.g., US)
        #[arg(long, default_value = "US")]
        market: String,
    },
    /// Print the fuzzy similarity ratio between two names
    Similarity {
        a: String,
        b: String,
        /// Report whether the ratio clears this threshold
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// List the prompt templates in effect
    Templates {
        /// YAML catalog to load instead of the built-in one
        #[arg(long, env = "BRANDVIS_TEMPLATES_PATH")]
        path: Option<PathBuf>,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Analyze(args)) => {
            let config = brandvis_core::load_app_config()?;
            analyze::run_analyze(&config, args).await?;
        }
        Some(Commands::Refine { prompt, market }) => {
            let config = brandvis_core::load_app_config()?;
            analyze::run_refine(&config, &prompt, &market).await?;
        }
        Some(Commands::Similarity { a, b, threshold }) => {
            println!("{}", render_similarity(&a, &b, threshold));
        }
        Some(Commands::Templates { path }) => {
            let templates = brandvis_core::load_templates(path.as_deref())?;
            println!("version: {}", templates.version());
            for name in templates.names() {
                println!("  {name}");
            }
        }
        Some(Commands::Db { command }) => match command {
            DbCommands::Ping => db::run_db_ping().await?,
            DbCommands::Migrate => db::run_db_migrate().await?,
        },
        None => println!("brandvis-cli: run with --help to list commands"),
    }

    Ok(())
}

fn render_similarity(a: &str, b: &str, threshold: Option<f64>) -> String {
    let ratio = brandvis_visibility::similarity(a, b);
    match threshold {
        Some(threshold) => {
            let matcher = brandvis_visibility::BrandMatcher::new(threshold);
            let verdict = if matcher.is_visible(a, &[b.to_owned()]) {
                "match"
            } else {
                "no match"
            };
            format!("{ratio:.4} ({verdict} at {:.2})", matcher.threshold())
        }
        None => format!("{ratio:.4}"),
    }
}
