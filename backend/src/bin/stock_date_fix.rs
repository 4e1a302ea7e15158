//! Daily maintenance command: realign stock entry dates with their sale and
//! purchase documents. Intended to be run once a day by an external scheduler.

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shop_backend::{services::MaintenanceService, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_date_fix=info,shop_backend=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::load()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    let report = MaintenanceService::new(db_pool).fix_stock_dates().await?;

    tracing::info!(total = report.total(), "Stock date fix finished");
    Ok(())
}
