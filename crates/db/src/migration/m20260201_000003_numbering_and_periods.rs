//! Number sequences and period locks.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NumberSequences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NumberSequences::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NumberSequences::Scope).string_len(50).not_null())
                    .col(ColumnDef::new(NumberSequences::Code).string_len(50).not_null())
                    .col(
                        ColumnDef::new(NumberSequences::Name)
                            .string_len(100)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(NumberSequences::Prefix)
                            .string_len(20)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(NumberSequences::Format).string_len(120).not_null())
                    .col(
                        ColumnDef::new(NumberSequences::Reset)
                            .string_len(10)
                            .not_null()
                            .default("monthly"),
                    )
                    .col(
                        ColumnDef::new(NumberSequences::Padding)
                            .integer()
                            .not_null()
                            .default(4),
                    )
                    .col(
                        ColumnDef::new(NumberSequences::LastNumber)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(NumberSequences::PeriodYear).integer().null())
                    .col(ColumnDef::new(NumberSequences::PeriodMonth).integer().null())
                    .col(
                        ColumnDef::new(NumberSequences::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_number_sequences_scope_code")
                    .table(NumberSequences::Table)
                    .col(NumberSequences::Scope)
                    .col(NumberSequences::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PeriodLocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PeriodLocks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PeriodLocks::Year).integer().not_null())
                    .col(ColumnDef::new(PeriodLocks::Month).integer().not_null())
                    .col(
                        ColumnDef::new(PeriodLocks::IsLocked)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PeriodLocks::LockedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PeriodLocks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_period_locks_year_month")
                    .table(PeriodLocks::Table)
                    .col(PeriodLocks::Year)
                    .col(PeriodLocks::Month)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PeriodLocks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(NumberSequences::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum NumberSequences {
    Table,
    Id,
    Scope,
    Code,
    Name,
    Prefix,
    Format,
    Reset,
    Padding,
    LastNumber,
    PeriodYear,
    PeriodMonth,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PeriodLocks {
    Table,
    Id,
    Year,
    Month,
    IsLocked,
    LockedAt,
    UpdatedAt,
}
