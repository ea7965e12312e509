use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use super::parse_instrument;
use crate::AppState;
use crate::models::ingestion::{ErrorResponse, IngestionRunReport, InstrumentRunResponse};

/// Manual trigger for the combined RM+KC run. The body carries the
/// per-instrument outcomes; a partial failure is not an HTTP error.
pub async fn run_ingestion(State(state): State<AppState>) -> Json<IngestionRunReport> {
    Json(state.ingestion.ingest_all().await)
}

pub async fn run_instrument_ingestion(
    State(state): State<AppState>,
    Path(instrument): Path<String>,
) -> Result<Json<InstrumentRunResponse>, (StatusCode, Json<ErrorResponse>)> {
    let instrument = parse_instrument(&instrument)?;

    let response = match state.ingestion.ingest(instrument).await {
        Ok(outcome) => InstrumentRunResponse {
            instrument,
            success: true,
            message: outcome.summary(),
            timestamp: Utc::now(),
        },
        Err(e) => InstrumentRunResponse {
            instrument,
            success: false,
            message: e.to_string(),
            timestamp: Utc::now(),
        },
    };

    Ok(Json(response))
}

pub async fn ingestion_status(
    State(state): State<AppState>,
) -> Result<Json<IngestionRunReport>, (StatusCode, Json<ErrorResponse>)> {
    state.ingestion.last_run().map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no ingestion run has completed yet".to_string(),
            }),
        )
    })
}
