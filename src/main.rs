use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shoplist_bot::cli::{Cli, Commands, MigrateAction};
use shoplist_bot::config::{BotConfig, LogFormat, MigrateConfig};
use shoplist_bot::db::{self, PgStorage};
use shoplist_bot::memory_storage::MemoryStorage;
use shoplist_bot::storage::Storage;
use shoplist_bot::telegram;

fn init_tracing(debug: bool, log_format: LogFormat) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    match cli.into_command() {
        Commands::Run => run_bot().await,
        Commands::Migrate { action } => migrate(action).await,
    }
}

async fn run_bot() -> Result<()> {
    let config = BotConfig::from_env()?;
    init_tracing(config.debug, config.log_format);

    info!("Starting Shopping List Telegram Bot");

    let storage: Arc<dyn Storage> = match &config.database_url {
        Some(database_url) => {
            let pool = db::connect(database_url, config.database_max_connections).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgStorage::new(pool))
        }
        None => {
            warn!("DATABASE_URL is not set, the shopping lists will be lost on restart");
            Arc::new(MemoryStorage::new())
        }
    };

    telegram::run(&config, storage).await
}

async fn migrate(action: MigrateAction) -> Result<()> {
    let config = MigrateConfig::from_env()?;
    init_tracing(config.debug, config.log_format);

    let pool = db::connect(&config.database_url, 1).await?;
    match action {
        MigrateAction::Up => db::run_migrations(&pool).await?,
        MigrateAction::Down { target } => db::revert_migrations(&pool, target).await?,
        MigrateAction::Version => match db::schema_version(&pool).await? {
            Some(current) if current.dirty => {
                println!("Current migration: {} (dirty)", current.version)
            }
            Some(current) => println!("Current migration: {}", current.version),
            None => println!("No migrations applied"),
        },
    }

    pool.close().await;
    Ok(())
}
