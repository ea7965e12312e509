pub mod ingestion;
pub mod market_data;

use axum::{Json, http::StatusCode};

use crate::models::ingestion::ErrorResponse;
use crate::models::instrument::Instrument;

pub(crate) fn parse_instrument(
    raw: &str,
) -> Result<Instrument, (StatusCode, Json<ErrorResponse>)> {
    raw.parse()
        .map_err(|error| (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })))
}
