//! Market data store: keyed upserts over the persistence backend
//!
//! All pipeline writes go through the `MarketStore` trait so the
//! orchestrator receives an explicit store handle instead of reaching for a
//! process-wide connection, and tests can substitute an in-memory store.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use thiserror::Error;

use crate::entities::{ma_discount_settings, ma_discount_values, market_data, prelude::*};
use crate::models::instrument::Instrument;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Field set for one trading day's snapshot, before persistence assigns ids
/// and timestamps.
#[derive(Debug, Clone)]
pub struct NewMarketData {
    pub instrument: Instrument,
    pub trade_date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    pub usd_price: Decimal,
    pub idr_rate: Decimal,
    pub idr_price: Decimal,
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Insert or update-in-place the row keyed by (instrument, trade_date).
    async fn upsert_market_data(
        &self,
        record: NewMarketData,
    ) -> Result<market_data::Model, StoreError>;

    /// Second write after insert: attach the trailing average to the row.
    async fn set_moving_average(
        &self,
        instrument: Instrument,
        trade_date: NaiveDate,
        average: Decimal,
    ) -> Result<(), StoreError>;

    /// Up to `limit` rows with `trade_date <= before_or_on`, newest first.
    async fn recent_market_data(
        &self,
        instrument: Instrument,
        before_or_on: NaiveDate,
        limit: u64,
    ) -> Result<Vec<market_data::Model>, StoreError>;

    async fn list_discount_settings(
        &self,
        instrument: Instrument,
    ) -> Result<Vec<ma_discount_settings::Model>, StoreError>;

    /// Write the derived value keyed by (trade_date, setting_id), replacing
    /// any previously generated row for that pair.
    async fn replace_discount_value(
        &self,
        setting: &ma_discount_settings::Model,
        trade_date: NaiveDate,
        value: Decimal,
    ) -> Result<(), StoreError>;

    async fn recent_discount_values(
        &self,
        instrument: Instrument,
        limit: u64,
    ) -> Result<Vec<ma_discount_values::Model>, StoreError>;
}

pub struct DbMarketStore {
    db: DatabaseConnection,
}

impl DbMarketStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MarketStore for DbMarketStore {
    async fn upsert_market_data(
        &self,
        record: NewMarketData,
    ) -> Result<market_data::Model, StoreError> {
        let existing = MarketData::find()
            .filter(market_data::Column::Instrument.eq(record.instrument.code()))
            .filter(market_data::Column::TradeDate.eq(record.trade_date))
            .one(&self.db)
            .await?;

        let model = if let Some(existing) = existing {
            let mut active: market_data::ActiveModel = existing.into();
            active.open = Set(record.open);
            active.high = Set(record.high);
            active.low = Set(record.low);
            active.close = Set(record.close);
            active.volume = Set(record.volume);
            active.usd_price = Set(record.usd_price);
            active.idr_rate = Set(record.idr_rate);
            active.idr_price = Set(record.idr_price);
            active.updated_at = Set(Some(Utc::now().naive_utc()));
            active.update(&self.db).await?
        } else {
            market_data::ActiveModel {
                instrument: Set(record.instrument.code().to_string()),
                trade_date: Set(record.trade_date),
                open: Set(record.open),
                high: Set(record.high),
                low: Set(record.low),
                close: Set(record.close),
                volume: Set(record.volume),
                usd_price: Set(record.usd_price),
                idr_rate: Set(record.idr_rate),
                idr_price: Set(record.idr_price),
                moving_average_30: Set(None),
                created_at: Set(Some(Utc::now().naive_utc())),
                updated_at: Set(Some(Utc::now().naive_utc())),
                ..Default::default()
            }
            .insert(&self.db)
            .await?
        };

        Ok(model)
    }

    async fn set_moving_average(
        &self,
        instrument: Instrument,
        trade_date: NaiveDate,
        average: Decimal,
    ) -> Result<(), StoreError> {
        let existing = MarketData::find()
            .filter(market_data::Column::Instrument.eq(instrument.code()))
            .filter(market_data::Column::TradeDate.eq(trade_date))
            .one(&self.db)
            .await?;

        let Some(existing) = existing else {
            return Err(StoreError::Database(sea_orm::DbErr::RecordNotFound(
                format!("no market data for {} on {}", instrument, trade_date),
            )));
        };

        let mut active: market_data::ActiveModel = existing.into();
        active.moving_average_30 = Set(Some(average));
        active.updated_at = Set(Some(Utc::now().naive_utc()));
        active.update(&self.db).await?;

        Ok(())
    }

    async fn recent_market_data(
        &self,
        instrument: Instrument,
        before_or_on: NaiveDate,
        limit: u64,
    ) -> Result<Vec<market_data::Model>, StoreError> {
        let records = MarketData::find()
            .filter(market_data::Column::Instrument.eq(instrument.code()))
            .filter(market_data::Column::TradeDate.lte(before_or_on))
            .order_by_desc(market_data::Column::TradeDate)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(records)
    }

    async fn list_discount_settings(
        &self,
        instrument: Instrument,
    ) -> Result<Vec<ma_discount_settings::Model>, StoreError> {
        let settings = MaDiscountSettings::find()
            .filter(ma_discount_settings::Column::Instrument.eq(instrument.code()))
            .all(&self.db)
            .await?;

        Ok(settings)
    }

    async fn replace_discount_value(
        &self,
        setting: &ma_discount_settings::Model,
        trade_date: NaiveDate,
        value: Decimal,
    ) -> Result<(), StoreError> {
        let existing = MaDiscountValues::find()
            .filter(ma_discount_values::Column::SettingId.eq(setting.id))
            .filter(ma_discount_values::Column::TradeDate.eq(trade_date))
            .one(&self.db)
            .await?;

        if let Some(existing) = existing {
            let mut active: ma_discount_values::ActiveModel = existing.into();
            active.value = Set(value);
            active.created_at = Set(Some(Utc::now().naive_utc()));
            active.update(&self.db).await?;
        } else {
            ma_discount_values::ActiveModel {
                setting_id: Set(setting.id),
                instrument: Set(setting.instrument.clone()),
                trade_date: Set(trade_date),
                value: Set(value),
                created_at: Set(Some(Utc::now().naive_utc())),
                ..Default::default()
            }
            .insert(&self.db)
            .await?;
        }

        Ok(())
    }

    async fn recent_discount_values(
        &self,
        instrument: Instrument,
        limit: u64,
    ) -> Result<Vec<ma_discount_values::Model>, StoreError> {
        let values = MaDiscountValues::find()
            .filter(ma_discount_values::Column::Instrument.eq(instrument.code()))
            .order_by_desc(ma_discount_values::Column::TradeDate)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(values)
    }
}
