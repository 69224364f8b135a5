use clap::Parser;
use donations_core::cli::{self, Cli, Commands, DbCommands, DonationCommands};
use donations_core::config::Config;
use donations_core::db::{self, DonationStore, PgDonationStore};
use donations_core::providers::{EpaymentlyConfig, PaystackConfig};
use donations_core::{create_app, AppState};
use sqlx::migrate::Migrator;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_info = Config::from_env()?;
    let config = config_info.config;

    tracing::info!(
        profile = ?config_info.profile,
        overrides = ?config_info.overrides,
        "Configuration loaded"
    );

    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Serve) => serve(config).await,
        Some(Commands::Donation(DonationCommands::Verify { reference, method })) => {
            cli::handle_donation_verify(&config, &reference, &method).await
        }
        Some(Commands::Donation(DonationCommands::Reconcile {
            older_than_hours,
            format,
        })) => cli::handle_donation_reconcile(&config, older_than_hours, &format).await,
        Some(Commands::Db(DbCommands::Migrate)) => cli::handle_db_migrate(&config).await,
        Some(Commands::Config) => cli::handle_config_validate(&config),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = db::create_pool(&config).await?;

    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    let store: Arc<dyn DonationStore> = Arc::new(PgDonationStore::new(pool.clone()));
    let state = AppState::build(
        pool,
        store,
        PaystackConfig::from_config(&config),
        EpaymentlyConfig::from_config(&config),
    );

    let app = create_app(state, config.cors_allowed_origins.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
