pub mod mem;
pub mod models;
pub mod queries;
pub mod store;

pub use mem::MemDonationStore;
pub use store::{DonationStore, PgDonationStore, StoreError};

use crate::config::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

pub async fn create_pool(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}
