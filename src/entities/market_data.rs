//! SeaORM Entity for the per-trading-day market data table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "market_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Instrument code ("RM" or "KC"); unique together with `trade_date`
    pub instrument: String,
    pub trade_date: Date,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    /// Close price in USD, as sourced from the exchange snapshot
    pub usd_price: Decimal,
    /// USD→IDR rate applied at ingestion time
    pub idr_rate: Decimal,
    pub idr_price: Decimal,
    /// Trailing mean of the latest 30 persisted closes; written after insert
    pub moving_average_30: Option<Decimal>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
