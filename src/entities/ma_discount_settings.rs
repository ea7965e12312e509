//! SeaORM Entity for discount-rule configuration
//!
//! Rows are managed out-of-band; the ingestion pipeline only reads them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ma_discount_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub instrument: String,
    pub label: String,
    /// Factor applied against the moving average: value = ma30 * (1 - ratio)
    pub discount_ratio: Decimal,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
