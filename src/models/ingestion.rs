//! Ingestion outcome payloads returned to trigger callers

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::instrument::Instrument;

/// Outcome of one instrument's ingestion within a run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub instrument: Instrument,
    pub success: bool,
    pub message: String,
}

/// Combined outcome of a full run across both instruments.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionRunReport {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub results: Vec<IngestReport>,
}

/// Response for a single-instrument manual trigger.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentRunResponse {
    pub instrument: Instrument,
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
