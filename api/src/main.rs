use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::{info, warn};

use cs_api::{create_app, logging, AppState};
use cs_core::repositories::{RateLimitStore, TokenRepository, UserRepository};
use cs_infra::database::{DatabasePool, MySqlTokenRepository, MySqlUserRepository};
use cs_infra::{
    create_notifier, InMemoryRateLimitStore, InMemoryTokenRepository, InMemoryUserRepository,
    RedisRateLimitStore,
};
use cs_shared::config::{RateLimitBackend, StorageBackend};
use cs_shared::{AppConfig, Environment};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    load_env_files();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid environment configuration:");
            for (field, messages) in e.field_errors() {
                for message in messages {
                    eprintln!("  {}: {}", field, message);
                }
            }
            std::process::exit(1);
        }
    };

    logging::init(&config.logging)?;
    info!(
        environment = %config.environment,
        app = %config.server.app_name,
        "Starting API server"
    );

    let (users, tokens) = build_credential_stores(&config).await?;
    let counters = build_counter_store(&config).await?;
    let notifier = create_notifier(&config.email)?;

    let state = web::Data::new(AppState::new(users, tokens, counters, notifier, &config)?);

    let _cleanup_task = Arc::clone(&state.cleanup).start_background_task();
    let _purge_task = Arc::clone(&state.rate_limiter).start_purge_task();

    let environment = config.environment;
    let bind_address = config.server.bind_address();
    info!(address = %bind_address, prefix = %config.server.api_prefix, "Server listening");

    let mut server = HttpServer::new(move || create_app(state.clone(), environment));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }
    server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await?;

    info!("Server stopped");
    Ok(())
}

/// `.env.<environment>` first so its values win, then `.env`
fn load_env_files() {
    let environment = std::env::var("APP_ENV")
        .or_else(|_| std::env::var("NODE_ENV"))
        .ok()
        .and_then(|raw| raw.parse::<Environment>().ok())
        .unwrap_or_default();
    dotenvy::from_filename(environment.env_file()).ok();
    dotenvy::dotenv().ok();
}

async fn build_credential_stores(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn UserRepository>, Arc<dyn TokenRepository>)> {
    match config.database.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory credential and token stores; data is lost on restart");
            Ok((
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryTokenRepository::new()),
            ))
        }
        StorageBackend::MySql => {
            let pool = DatabasePool::new(&config.database)
                .await
                .context("failed to connect to MySQL")?;
            pool.ensure_schema()
                .await
                .context("failed to prepare database schema")?;
            let pool = pool.get_pool().clone();
            Ok((
                Arc::new(MySqlUserRepository::new(pool.clone())),
                Arc::new(MySqlTokenRepository::new(pool)),
            ))
        }
    }
}

async fn build_counter_store(config: &AppConfig) -> anyhow::Result<Arc<dyn RateLimitStore>> {
    match config.rate_limit.backend {
        RateLimitBackend::Memory => {
            if config.environment.is_production() {
                warn!("Rate limit counters are per process; use the Redis backend when running several instances");
            }
            Ok(Arc::new(InMemoryRateLimitStore::new()))
        }
        RateLimitBackend::Redis => {
            let store = RedisRateLimitStore::connect(config.cache.clone())
                .await
                .context("failed to connect to Redis")?;
            Ok(Arc::new(store))
        }
    }
}
