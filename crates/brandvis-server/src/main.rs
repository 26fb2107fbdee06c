mod api;
mod jobs;
mod middleware;
mod runner;
mod scheduler;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use brandvis_db::{LogRunStore, PgRunStore, RunStore};
use brandvis_llm::Gateways;
use brandvis_visibility::AnalysisPipeline;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    jobs::JobTable,
    middleware::AuthState,
    runner::Runner,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = brandvis_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let templates = Arc::new(brandvis_core::load_templates(
        config.templates_path.as_deref(),
    )?);
    tracing::info!(version = templates.version(), "prompt templates loaded");

    let gateways = Gateways::from_config(&config)?;
    let pipeline = Arc::new(AnalysisPipeline::from_config(&config, gateways, templates)?);

    let store = build_store(&config).await?;

    let jobs = JobTable::new();
    let runner = Runner::new(
        jobs.clone(),
        pipeline,
        store,
        Duration::from_secs(config.job_deadline_secs),
    );

    let retention = chrono::Duration::seconds(i64::try_from(config.job_retention_secs)?);
    let _scheduler = scheduler::build_scheduler(jobs.clone(), retention).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        brandvis_core::Environment::Development
    ))?;
    let app = build_app(AppState { jobs, runner }, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "brandvis-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Postgres when `DATABASE_URL` is set, otherwise run records only go to the log.
async fn build_store(config: &brandvis_core::AppConfig) -> anyhow::Result<Arc<dyn RunStore>> {
    if config.database_url.is_none() {
        tracing::warn!("DATABASE_URL not set; run records will only be logged");
        return Ok(Arc::new(LogRunStore));
    }

    let pool = brandvis_db::connect_pool_from_config(config).await?;
    let applied = brandvis_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");
    Ok(Arc::new(PgRunStore::new(pool)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
