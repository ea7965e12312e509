use tokio::time::{Duration, interval};

use crate::services::ingestion::IngestionService;

/// Scheduled trigger: one combined RM+KC run per interval. Ingestion
/// failures are logged and left for the next tick; they never take the
/// process down.
pub async fn start_price_ingestion_job(ingestion: IngestionService, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(interval_secs));

        loop {
            interval.tick().await;
            tracing::info!("Starting scheduled price ingestion run");

            let report = ingestion.ingest_all().await;
            for result in &report.results {
                if result.success {
                    tracing::info!("[{}] {}", result.instrument, result.message);
                } else {
                    tracing::error!("[{}] {}", result.instrument, result.message);
                }
            }

            tracing::info!("Scheduled price ingestion run complete: {}", report.message);
        }
    });
}
