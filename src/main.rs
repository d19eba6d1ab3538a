use std::{sync::Arc, time::Duration};

use axum::Server;
use axum_session_todo::{config::Config, db, route::create_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

// Entry point of the application
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "invalid configuration");
            std::process::exit(1);
        }
    };

    // Connect to the database, creating it on first run
    let pool = match db::connect(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("connection to the database is successful");
            pool
        }
        Err(err) => {
            tracing::error!(%err, "failed to connect to the database");
            std::process::exit(1);
        }
    };

    if let Err(err) = db::migrate(&pool).await {
        tracing::error!(%err, "failed to create tables");
        std::process::exit(1);
    }

    let addr = config.addr();
    let state = Arc::new(AppState::new(pool, config));

    // Drop expired sessions and their access records in the background
    let purger = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(err) = purger.purge_expired_sessions(chrono::Utc::now()).await {
                tracing::warn!(%err, "session purge failed");
            }
        }
    });

    let app = create_router(state);

    tracing::info!(%addr, "server started");

    if let Err(err) = Server::bind(&addr).serve(app.into_make_service()).await {
        tracing::error!(%err, "server error");
        std::process::exit(1);
    }
}
