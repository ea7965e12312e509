use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MaDiscountSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MaDiscountSettings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MaDiscountSettings::Instrument)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaDiscountSettings::Label)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaDiscountSettings::DiscountRatio)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaDiscountSettings::CreatedAt)
                            .timestamp()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(MaDiscountSettings::UpdatedAt)
                            .timestamp()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // Settings are read back per instrument on every ingestion run
        manager
            .create_index(
                Index::create()
                    .name("idx_ma_discount_settings_instrument")
                    .table(MaDiscountSettings::Table)
                    .col(MaDiscountSettings::Instrument)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MaDiscountSettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MaDiscountSettings {
    Table,
    Id,
    Instrument,
    Label,
    DiscountRatio,
    CreatedAt,
    UpdatedAt,
}
