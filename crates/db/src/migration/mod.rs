//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration and written with the schema
//! builder so the same history runs on PostgreSQL and SQLite.
//!
//! Money columns are `DECIMAL(16, 2)`. SQLite keeps them as REAL, which
//! round-trips two-decimal amounts below 10^14.

pub use sea_orm_migration::prelude::*;

mod m20260201_000001_chart_of_accounts;
mod m20260201_000002_journals;
mod m20260201_000003_numbering_and_periods;
mod m20260201_000004_sequence_periods;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260201_000001_chart_of_accounts::Migration),
            Box::new(m20260201_000002_journals::Migration),
            Box::new(m20260201_000003_numbering_and_periods::Migration),
            Box::new(m20260201_000004_sequence_periods::Migration),
        ]
    }
}
