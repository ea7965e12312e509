pub mod barchart;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::instrument::Instrument;

/// One trading day of the active futures contract, as reported by the
/// source. `trade_date` is the payload's own date, never extraction
/// wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSnapshot {
    pub instrument: Instrument,
    pub trade_date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("source request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("source returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("quote session was not established: {0}")]
    Session(String),
    #[error("quote payload did not match the expected shape: {0}")]
    UnexpectedShape(String),
    #[error("no active contract for {0} in quote payload")]
    NoActiveContract(Instrument),
}

/// A snapshot either arrives whole or the call fails; there is no partial
/// result and no retry at this level.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_snapshot(
        &self,
        instrument: Instrument,
    ) -> Result<QuoteSnapshot, ExtractionError>;
}

#[derive(Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.barchart.com".to_string(),
            request_timeout_secs: 30,
        }
    }
}
