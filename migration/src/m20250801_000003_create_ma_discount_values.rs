use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MaDiscountValues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MaDiscountValues::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MaDiscountValues::SettingId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaDiscountValues::Instrument)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaDiscountValues::TradeDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MaDiscountValues::Value).decimal().not_null())
                    .col(
                        ColumnDef::new(MaDiscountValues::CreatedAt)
                            .timestamp()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // Regeneration for a trading day replaces the value per setting
        manager
            .create_index(
                Index::create()
                    .name("idx_ma_discount_values_unique")
                    .table(MaDiscountValues::Table)
                    .col(MaDiscountValues::TradeDate)
                    .col(MaDiscountValues::SettingId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Read path: values for an instrument, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_ma_discount_values_instrument_trade_date")
                    .table(MaDiscountValues::Table)
                    .col(MaDiscountValues::Instrument)
                    .col(MaDiscountValues::TradeDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MaDiscountValues::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MaDiscountValues {
    Table,
    Id,
    SettingId,
    Instrument,
    TradeDate,
    Value,
    CreatedAt,
}
