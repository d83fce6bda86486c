//! Counters of closed numbering periods.
//!
//! When a sequence resets, the counter of the period it leaves is kept here so
//! a back-dated document continues that period instead of reissuing numbers.
//! `period_month` is 0 for yearly sequences.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NumberSequencePeriods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NumberSequencePeriods::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NumberSequencePeriods::SequenceId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NumberSequencePeriods::PeriodYear)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NumberSequencePeriods::PeriodMonth)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(NumberSequencePeriods::LastNumber)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(NumberSequencePeriods::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_number_sequence_periods_sequence")
                            .from(NumberSequencePeriods::Table, NumberSequencePeriods::SequenceId)
                            .to(NumberSequences::Table, NumberSequences::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_number_sequence_periods_period")
                    .table(NumberSequencePeriods::Table)
                    .col(NumberSequencePeriods::SequenceId)
                    .col(NumberSequencePeriods::PeriodYear)
                    .col(NumberSequencePeriods::PeriodMonth)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NumberSequencePeriods::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum NumberSequencePeriods {
    Table,
    Id,
    SequenceId,
    PeriodYear,
    PeriodMonth,
    LastNumber,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum NumberSequences {
    Table,
    Id,
}
