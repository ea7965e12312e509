//! Read-side payloads for persisted market records

use serde::Serialize;

use crate::entities::{ma_discount_settings, ma_discount_values, market_data};
use crate::models::instrument::Instrument;

#[derive(Debug, Serialize)]
pub struct MarketDataResponse {
    pub instrument: Instrument,
    pub records: Vec<market_data::Model>,
}

#[derive(Debug, Serialize)]
pub struct DiscountValuesResponse {
    pub instrument: Instrument,
    pub values: Vec<ma_discount_values::Model>,
}

#[derive(Debug, Serialize)]
pub struct DiscountSettingsResponse {
    pub instrument: Instrument,
    pub settings: Vec<ma_discount_settings::Model>,
}
