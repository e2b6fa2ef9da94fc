use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc, time::Duration};

mod app;
mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod realtime;
mod repository;
mod stats;

use auth::rate_limit::RateLimiter;
use config::Config;
use db::PgStore;
use realtime::ChangeFeed;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub feed: ChangeFeed,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(db: PgPool, config: Arc<Config>) -> Self {
        let feed = ChangeFeed::new(config.realtime_channel_capacity);
        let rate_limiter = RateLimiter::new(
            config.auth_rate_limit_max,
            Duration::from_secs(config.auth_rate_limit_window_secs),
        );
        Self {
            db,
            config,
            feed,
            rate_limiter,
        }
    }

    /// Log reads for the stats pipeline.
    pub fn store(&self) -> PgStore {
        PgStore::new(self.db.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "habitlog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = db::create_pool(&config.database_url).await?;

    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database migrations applied");

    let state = AppState::new(db, config.clone());
    state.rate_limiter.spawn_purger();

    let app = app::build_router(state)?;

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    // Connect info feeds the per-IP auth rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
