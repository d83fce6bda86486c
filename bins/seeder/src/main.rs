//! Database seeder for FreightLedger.
//!
//! Seeds the standard freight-forwarding chart of accounts into the active
//! fiscal year and checks that the configured default accounts resolve.
//!
//! Usage: cargo run --bin seeder

mod chart;

use freightledger_db::{AccountRepository, connect_with};
use freightledger_shared::AppConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freightledger=debug,sea_orm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let year = config.accounting.active_fiscal_year;

    info!("Connecting to database...");
    let db = connect_with(&config.database).await?;
    let accounts = AccountRepository::new(db);

    if accounts.chart_exists(year).await? {
        info!(year, "chart of accounts exists, filling in missing codes");
    } else {
        warn!(year, "no chart of accounts for the active fiscal year, seeding a fresh one");
    }

    let summary = chart::seed_chart(&accounts, year).await?;
    info!(
        year,
        created = summary.created,
        renamed = summary.renamed,
        unchanged = summary.unchanged,
        total = chart::STANDARD_CHART.len(),
        "chart of accounts seeded"
    );

    match accounts.resolve_default_accounts(&config.accounting).await {
        Ok(defaults) => info!(mappings = defaults.len(), "default accounts resolved"),
        Err(err) => warn!(error = %err, "default accounts are not usable"),
    }

    Ok(())
}
