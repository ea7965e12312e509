use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MarketData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MarketData::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MarketData::Instrument).string().not_null())
                    .col(ColumnDef::new(MarketData::TradeDate).date().not_null())
                    .col(ColumnDef::new(MarketData::Open).decimal().not_null())
                    .col(ColumnDef::new(MarketData::High).decimal().not_null())
                    .col(ColumnDef::new(MarketData::Low).decimal().not_null())
                    .col(ColumnDef::new(MarketData::Close).decimal().not_null())
                    .col(
                        ColumnDef::new(MarketData::Volume)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MarketData::UsdPrice).decimal().not_null())
                    .col(ColumnDef::new(MarketData::IdrRate).decimal().not_null())
                    .col(ColumnDef::new(MarketData::IdrPrice).decimal().not_null())
                    .col(ColumnDef::new(MarketData::MovingAverage30).decimal().null())
                    .col(
                        ColumnDef::new(MarketData::CreatedAt)
                            .timestamp()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(MarketData::UpdatedAt)
                            .timestamp()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint: one snapshot per instrument per trading day
        manager
            .create_index(
                Index::create()
                    .name("idx_market_data_instrument_trade_date")
                    .table(MarketData::Table)
                    .col(MarketData::Instrument)
                    .col(MarketData::TradeDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MarketData::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MarketData {
    Table,
    Id,
    Instrument,
    TradeDate,
    Open,
    High,
    Low,
    Close,
    Volume,
    UsdPrice,
    IdrRate,
    IdrPrice,
    MovingAverage30,
    CreatedAt,
    UpdatedAt,
}
