use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use super::parse_instrument;
use crate::AppState;
use crate::models::ingestion::ErrorResponse;
use crate::models::market_data::{
    DiscountSettingsResponse, DiscountValuesResponse, MarketDataResponse,
};

const DEFAULT_LIMIT: u64 = 30;
const MAX_LIMIT: u64 = 365;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u64>,
}

fn db_error(e: impl std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Database error: {}", e),
        }),
    )
}

pub async fn get_market_data(
    State(state): State<AppState>,
    Path(instrument): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<MarketDataResponse>, (StatusCode, Json<ErrorResponse>)> {
    let instrument = parse_instrument(&instrument)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let records = state
        .ingestion
        .store()
        .recent_market_data(instrument, Utc::now().date_naive(), limit)
        .await
        .map_err(db_error)?;

    Ok(Json(MarketDataResponse {
        instrument,
        records,
    }))
}

pub async fn get_discount_values(
    State(state): State<AppState>,
    Path(instrument): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<DiscountValuesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let instrument = parse_instrument(&instrument)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let values = state
        .ingestion
        .store()
        .recent_discount_values(instrument, limit)
        .await
        .map_err(db_error)?;

    Ok(Json(DiscountValuesResponse { instrument, values }))
}

pub async fn get_discount_settings(
    State(state): State<AppState>,
    Path(instrument): Path<String>,
) -> Result<Json<DiscountSettingsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let instrument = parse_instrument(&instrument)?;

    let settings = state
        .ingestion
        .store()
        .list_discount_settings(instrument)
        .await
        .map_err(db_error)?;

    Ok(Json(DiscountSettingsResponse {
        instrument,
        settings,
    }))
}
