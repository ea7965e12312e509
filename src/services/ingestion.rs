//! Ingestion orchestrator
//!
//! Composes extraction, conversion, persistence, averaging and discount
//! generation into one idempotent run per instrument, and the combined
//! RM-then-KC run with per-instrument failure isolation. Collaborators are
//! injected as trait handles; nothing here reaches for process-wide state.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::ingestion::{IngestReport, IngestionRunReport};
use crate::models::instrument::Instrument;
use crate::scrapers::{ExtractionError, QuoteSource};
use crate::services::discount;
use crate::services::exchange_rate::RateSource;
use crate::services::moving_average::{self, MovingAverageError};
use crate::services::store::{MarketStore, NewMarketData, StoreError};

/// Progression of one instrument's run. Conversion never fails (the rate
/// source degrades internally), so `Converting` appears in logs but not in
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Extracting,
    Converting,
    Persisting,
    Averaging,
    Discounting,
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            IngestStage::Extracting => "extracting",
            IngestStage::Converting => "converting",
            IngestStage::Persisting => "persisting",
            IngestStage::Averaging => "averaging",
            IngestStage::Discounting => "discounting",
        };
        write!(f, "{}", stage)
    }
}

#[derive(Debug, Error)]
pub enum IngestFailure {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Persistence(#[from] StoreError),
    #[error("{0}")]
    Aggregation(String),
}

/// A run aborts at the failing stage; partial writes stay in place because
/// the keyed upserts make the next successful run self-correcting.
#[derive(Debug, Error)]
#[error("{instrument} ingestion failed while {stage}: {source}")]
pub struct IngestError {
    pub instrument: Instrument,
    pub stage: IngestStage,
    #[source]
    pub source: IngestFailure,
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub instrument: Instrument,
    pub trade_date: NaiveDate,
    pub usd_price: Decimal,
    pub idr_rate: Decimal,
    pub idr_price: Decimal,
    pub moving_average_30: Option<Decimal>,
    pub discount_values: usize,
}

impl IngestOutcome {
    pub fn summary(&self) -> String {
        let average = self
            .moving_average_30
            .map(|a| a.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "ingested {} for {}: close {} USD @ rate {}, MA30 {}, {} discount values",
            self.instrument,
            self.trade_date,
            self.usd_price,
            self.idr_rate,
            average,
            self.discount_values
        )
    }
}

#[derive(Clone)]
pub struct IngestionService {
    quotes: Arc<dyn QuoteSource>,
    rates: Arc<dyn RateSource>,
    store: Arc<dyn MarketStore>,
    // Overlapping triggers (scheduled + manual) serialize on this lock
    run_lock: Arc<Mutex<()>>,
    last_run: Arc<RwLock<Option<IngestionRunReport>>>,
}

impl IngestionService {
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        rates: Arc<dyn RateSource>,
        store: Arc<dyn MarketStore>,
    ) -> Self {
        Self {
            quotes,
            rates,
            store,
            run_lock: Arc::new(Mutex::new(())),
            last_run: Arc::new(RwLock::new(None)),
        }
    }

    pub fn store(&self) -> &dyn MarketStore {
        self.store.as_ref()
    }

    /// Report of the most recent combined run, if any has completed.
    pub fn last_run(&self) -> Option<IngestionRunReport> {
        self.last_run.read().clone()
    }

    pub async fn ingest(&self, instrument: Instrument) -> Result<IngestOutcome, IngestError> {
        let _guard = self.run_lock.lock().await;
        self.ingest_instrument(instrument).await
    }

    /// Runs both instruments sequentially under one lock acquisition. A
    /// failure in the first never prevents the second from running; the
    /// report carries both outcomes.
    pub async fn ingest_all(&self) -> IngestionRunReport {
        let _guard = self.run_lock.lock().await;

        let mut results = Vec::with_capacity(Instrument::ALL.len());
        for instrument in Instrument::ALL {
            let report = match self.ingest_instrument(instrument).await {
                Ok(outcome) => {
                    let message = outcome.summary();
                    tracing::info!("[{}] {}", instrument, message);
                    IngestReport {
                        instrument,
                        success: true,
                        message,
                    }
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    IngestReport {
                        instrument,
                        success: false,
                        message: e.to_string(),
                    }
                }
            };
            results.push(report);
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        let report = IngestionRunReport {
            success: succeeded == results.len(),
            message: format!("{}/{} instruments ingested", succeeded, results.len()),
            timestamp: Utc::now(),
            results,
        };

        *self.last_run.write() = Some(report.clone());
        report
    }

    async fn ingest_instrument(
        &self,
        instrument: Instrument,
    ) -> Result<IngestOutcome, IngestError> {
        let fail = |stage: IngestStage, source: IngestFailure| IngestError {
            instrument,
            stage,
            source,
        };

        tracing::info!("[{}] extracting quote snapshot", instrument);
        let snapshot = self
            .quotes
            .fetch_snapshot(instrument)
            .await
            .map_err(|e| fail(IngestStage::Extracting, IngestFailure::Extraction(e)))?;

        tracing::info!(
            "[{}] converting close {} USD for {}",
            instrument,
            snapshot.close,
            snapshot.trade_date
        );
        let idr_rate = self.rates.usd_to_idr().await;
        let usd_price = snapshot.close;
        let idr_price = usd_price * idr_rate;

        tracing::info!("[{}] persisting market data for {}", instrument, snapshot.trade_date);
        let record = self
            .store
            .upsert_market_data(NewMarketData {
                instrument,
                trade_date: snapshot.trade_date,
                open: snapshot.open,
                high: snapshot.high,
                low: snapshot.low,
                close: snapshot.close,
                volume: snapshot.volume,
                usd_price,
                idr_rate,
                idr_price,
            })
            .await
            .map_err(|e| fail(IngestStage::Persisting, IngestFailure::Persistence(e)))?;
        tracing::debug!("[{}] market data row {} upserted", instrument, record.id);

        tracing::info!("[{}] averaging over persisted history", instrument);
        let moving_average =
            moving_average::moving_average_30(self.store.as_ref(), instrument, snapshot.trade_date)
                .await
                .map_err(|e| match e {
                    MovingAverageError::Store(e) => {
                        fail(IngestStage::Averaging, IngestFailure::Persistence(e))
                    }
                    MovingAverageError::Aggregation(msg) => {
                        fail(IngestStage::Averaging, IngestFailure::Aggregation(msg))
                    }
                })?;

        let discount_values = match moving_average {
            Some(average) => {
                self.store
                    .set_moving_average(instrument, snapshot.trade_date, average)
                    .await
                    .map_err(|e| fail(IngestStage::Averaging, IngestFailure::Persistence(e)))?;

                tracing::info!("[{}] deriving discount values", instrument);
                discount::generate_discount_values(
                    self.store.as_ref(),
                    instrument,
                    snapshot.trade_date,
                    average,
                )
                .await
                .map_err(|e| fail(IngestStage::Discounting, IngestFailure::Persistence(e)))?
            }
            None => 0,
        };

        Ok(IngestOutcome {
            instrument,
            trade_date: snapshot.trade_date,
            usd_price,
            idr_rate,
            idr_price,
            moving_average_30: moving_average,
            discount_values,
        })
    }
}
