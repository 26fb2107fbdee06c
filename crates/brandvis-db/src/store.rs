//! Where completed analyses are recorded.

use brandvis_core::RunRecord;
use futures::future::BoxFuture;
use sqlx::PgPool;

use crate::{health_check, insert_visibility_run, DbError};

/// Write-only sink for run summaries.
pub trait RunStore: Send + Sync {
    /// Short label for logs and health output.
    fn kind(&self) -> &'static str;

    fn record<'a>(&'a self, record: &'a RunRecord) -> BoxFuture<'a, Result<(), DbError>>;

    /// Whether the store can currently accept records.
    fn check(&self) -> BoxFuture<'_, Result<(), DbError>>;
}

/// Stores runs in the `visibility_runs` table.
#[derive(Debug, Clone)]
pub struct PgRunStore {
    pool: PgPool,
}

impl PgRunStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RunStore for PgRunStore {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    fn record<'a>(&'a self, record: &'a RunRecord) -> BoxFuture<'a, Result<(), DbError>> {
        Box::pin(async move {
            let row = insert_visibility_run(&self.pool, record).await?;
            tracing::debug!(run_id = %row.public_id, brand = %row.brand, "run recorded");
            Ok(())
        })
    }

    fn check(&self) -> BoxFuture<'_, Result<(), DbError>> {
        Box::pin(health_check(&self.pool))
    }
}

/// Emits each run as a structured log line; used when no database is configured.
///
/// The requester's email is only logged at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRunStore;

impl RunStore for LogRunStore {
    fn kind(&self) -> &'static str {
        "log"
    }

    fn record<'a>(&'a self, record: &'a RunRecord) -> BoxFuture<'a, Result<(), DbError>> {
        tracing::info!(
            seed_keyword = %record.seed_keyword,
            brand = %record.brand,
            market = %record.market,
            visibility = record.visibility,
            top_3_brands = ?record.top_3_brands,
            created_at = %record.created_at,
            "visibility run"
        );
        tracing::debug!(email = %record.email, "visibility run requester");
        Box::pin(async { Ok(()) })
    }

    fn check(&self) -> BoxFuture<'_, Result<(), DbError>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Log output of one `LogRunStore::record` call at `level`.
    fn log_store_output(level: tracing::Level) -> String {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();
        let record = record();
        tracing::subscriber::with_default(subscriber, || {
            drop(LogRunStore.record(&record));
        });
        let bytes = logs.0.lock().expect("log buffer").clone();
        String::from_utf8(bytes).expect("utf-8 log output")
    }

    fn record() -> RunRecord {
        RunRecord {
            email: "ops@example.com".to_owned(),
            seed_keyword: "crm".to_owned(),
            brand: "Acme".to_owned(),
            market: "US".to_owned(),
            visibility: 40.0,
            top_3_brands: vec!["acme".to_owned(), "hubspot".to_owned()],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn log_store_always_succeeds() {
        let store = LogRunStore;
        assert_eq!(store.kind(), "log");
        store.record(&record()).await.expect("infallible");
        store.check().await.expect("log store is always available");
    }

    #[test]
    fn log_store_keeps_email_out_of_info_logs() {
        let info = log_store_output(tracing::Level::INFO);
        assert!(info.contains("visibility run"), "logs: {info}");
        assert!(info.contains("brand=Acme"), "logs: {info}");
        assert!(!info.contains("ops@example.com"), "logs: {info}");

        let debug = log_store_output(tracing::Level::DEBUG);
        assert!(debug.contains("email=ops@example.com"), "logs: {debug}");
    }

    #[test]
    fn stores_are_usable_as_trait_objects() {
        let stores: Vec<Box<dyn RunStore>> = vec![Box::new(LogRunStore)];
        assert_eq!(stores[0].kind(), "log");
    }
}
