//! SeaORM Entity for derived discount values
//!
//! One row per (trade_date, setting_id); regeneration replaces the row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ma_discount_values")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub setting_id: i32,
    pub instrument: String,
    pub trade_date: Date,
    pub value: Decimal,
    pub created_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
