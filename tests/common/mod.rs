#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use coffeemarket_backend::entities::{ma_discount_settings, ma_discount_values, market_data};
use coffeemarket_backend::models::instrument::Instrument;
use coffeemarket_backend::scrapers::{ExtractionError, QuoteSnapshot, QuoteSource};
use coffeemarket_backend::services::exchange_rate::RateSource;
use coffeemarket_backend::services::ingestion::IngestionService;
use coffeemarket_backend::services::store::{MarketStore, NewMarketData, StoreError};

/// In-memory substitute store with the same keyed semantics as the
/// database-backed one: upsert by (instrument, trade_date), replace by
/// (trade_date, setting_id), ordered read-back.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<MemState>,
}

#[derive(Default)]
struct MemState {
    next_id: i32,
    market_data: Vec<market_data::Model>,
    settings: Vec<ma_discount_settings::Model>,
    values: Vec<ma_discount_values::Model>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_market_data(
        &self,
        instrument: Instrument,
        trade_date: NaiveDate,
        usd_price: Decimal,
    ) {
        let mut state = self.inner.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.market_data.push(market_data::Model {
            id,
            instrument: instrument.code().to_string(),
            trade_date,
            open: usd_price,
            high: usd_price,
            low: usd_price,
            close: usd_price,
            volume: 100,
            usd_price,
            idr_rate: dec!(16000),
            idr_price: usd_price * dec!(16000),
            moving_average_30: None,
            created_at: Some(Utc::now().naive_utc()),
            updated_at: Some(Utc::now().naive_utc()),
        });
    }

    pub fn add_setting(&self, instrument: Instrument, label: &str, discount_ratio: Decimal) -> i32 {
        let mut state = self.inner.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.settings.push(ma_discount_settings::Model {
            id,
            instrument: instrument.code().to_string(),
            label: label.to_string(),
            discount_ratio,
            created_at: Some(Utc::now().naive_utc()),
            updated_at: Some(Utc::now().naive_utc()),
        });
        id
    }

    pub fn market_data(&self) -> Vec<market_data::Model> {
        self.inner.lock().market_data.clone()
    }

    pub fn discount_values(&self) -> Vec<ma_discount_values::Model> {
        self.inner.lock().values.clone()
    }
}

#[async_trait]
impl MarketStore for MemStore {
    async fn upsert_market_data(
        &self,
        record: NewMarketData,
    ) -> Result<market_data::Model, StoreError> {
        let mut state = self.inner.lock();

        if let Some(existing) = state.market_data.iter_mut().find(|row| {
            row.instrument == record.instrument.code() && row.trade_date == record.trade_date
        }) {
            existing.open = record.open;
            existing.high = record.high;
            existing.low = record.low;
            existing.close = record.close;
            existing.volume = record.volume;
            existing.usd_price = record.usd_price;
            existing.idr_rate = record.idr_rate;
            existing.idr_price = record.idr_price;
            existing.updated_at = Some(Utc::now().naive_utc());
            return Ok(existing.clone());
        }

        state.next_id += 1;
        let id = state.next_id;
        let model = market_data::Model {
            id,
            instrument: record.instrument.code().to_string(),
            trade_date: record.trade_date,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
            usd_price: record.usd_price,
            idr_rate: record.idr_rate,
            idr_price: record.idr_price,
            moving_average_30: None,
            created_at: Some(Utc::now().naive_utc()),
            updated_at: Some(Utc::now().naive_utc()),
        };
        state.market_data.push(model.clone());
        Ok(model)
    }

    async fn set_moving_average(
        &self,
        instrument: Instrument,
        trade_date: NaiveDate,
        average: Decimal,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.lock();

        let Some(row) = state
            .market_data
            .iter_mut()
            .find(|row| row.instrument == instrument.code() && row.trade_date == trade_date)
        else {
            return Err(StoreError::Database(sea_orm::DbErr::RecordNotFound(
                format!("no market data for {} on {}", instrument, trade_date),
            )));
        };

        row.moving_average_30 = Some(average);
        row.updated_at = Some(Utc::now().naive_utc());
        Ok(())
    }

    async fn recent_market_data(
        &self,
        instrument: Instrument,
        before_or_on: NaiveDate,
        limit: u64,
    ) -> Result<Vec<market_data::Model>, StoreError> {
        let state = self.inner.lock();

        let mut records: Vec<market_data::Model> = state
            .market_data
            .iter()
            .filter(|row| row.instrument == instrument.code() && row.trade_date <= before_or_on)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.trade_date.cmp(&a.trade_date));
        records.truncate(limit as usize);

        Ok(records)
    }

    async fn list_discount_settings(
        &self,
        instrument: Instrument,
    ) -> Result<Vec<ma_discount_settings::Model>, StoreError> {
        let state = self.inner.lock();
        Ok(state
            .settings
            .iter()
            .filter(|setting| setting.instrument == instrument.code())
            .cloned()
            .collect())
    }

    async fn replace_discount_value(
        &self,
        setting: &ma_discount_settings::Model,
        trade_date: NaiveDate,
        value: Decimal,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.lock();

        if let Some(existing) = state
            .values
            .iter_mut()
            .find(|row| row.setting_id == setting.id && row.trade_date == trade_date)
        {
            existing.value = value;
            existing.created_at = Some(Utc::now().naive_utc());
            return Ok(());
        }

        state.next_id += 1;
        let id = state.next_id;
        state.values.push(ma_discount_values::Model {
            id,
            setting_id: setting.id,
            instrument: setting.instrument.clone(),
            trade_date,
            value,
            created_at: Some(Utc::now().naive_utc()),
        });
        Ok(())
    }

    async fn recent_discount_values(
        &self,
        instrument: Instrument,
        limit: u64,
    ) -> Result<Vec<ma_discount_values::Model>, StoreError> {
        let state = self.inner.lock();

        let mut values: Vec<ma_discount_values::Model> = state
            .values
            .iter()
            .filter(|row| row.instrument == instrument.code())
            .cloned()
            .collect();
        values.sort_by(|a, b| b.trade_date.cmp(&a.trade_date));
        values.truncate(limit as usize);

        Ok(values)
    }
}

/// Programmable quote source: one canned snapshot or failure per
/// instrument.
#[derive(Default)]
pub struct StubQuotes {
    responses: Mutex<HashMap<Instrument, Result<QuoteSnapshot, String>>>,
}

impl StubQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, snapshot: QuoteSnapshot) {
        self.responses
            .lock()
            .insert(snapshot.instrument, Ok(snapshot));
    }

    pub fn fail(&self, instrument: Instrument, message: &str) {
        self.responses
            .lock()
            .insert(instrument, Err(message.to_string()));
    }
}

#[async_trait]
impl QuoteSource for StubQuotes {
    async fn fetch_snapshot(
        &self,
        instrument: Instrument,
    ) -> Result<QuoteSnapshot, ExtractionError> {
        match self.responses.lock().get(&instrument) {
            Some(Ok(snapshot)) => Ok(snapshot.clone()),
            Some(Err(message)) => Err(ExtractionError::Session(message.clone())),
            None => Err(ExtractionError::NoActiveContract(instrument)),
        }
    }
}

pub struct StubRates {
    rate: Decimal,
}

impl StubRates {
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }
}

#[async_trait]
impl RateSource for StubRates {
    async fn usd_to_idr(&self) -> Decimal {
        self.rate
    }
}

pub fn snapshot(instrument: Instrument, date: &str, close: Decimal) -> QuoteSnapshot {
    QuoteSnapshot {
        instrument,
        trade_date: date.parse().expect("test date"),
        open: close - dec!(25),
        high: close + dec!(40),
        low: close - dec!(55),
        close,
        volume: 1200,
    }
}

pub fn pipeline(store: Arc<MemStore>, quotes: Arc<StubQuotes>, rate: Decimal) -> IngestionService {
    IngestionService::new(quotes, Arc::new(StubRates::new(rate)), store)
}
