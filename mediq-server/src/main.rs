//! MediQ booking service

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediq_server::{
    routes, seed_demo_data, AppState, BookingLedger, Config, InMemoryScheduleStore,
    InMemorySessionStore, InMemoryUserStore, SessionStore, SqliteStore, UserStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediq_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    match config.database_path.as_deref() {
        Some(path) => {
            let store = Arc::new(SqliteStore::open(path)?);
            tracing::info!(path, "Using SQLite store");
            serve(&config, store.clone(), store.clone(), store).await
        }
        None => {
            tracing::info!("Using in-memory stores");
            serve(
                &config,
                InMemoryUserStore::new(),
                InMemoryScheduleStore::new(),
                InMemorySessionStore::new(),
            )
            .await
        }
    }
}

async fn serve<U, B, S>(config: &Config, users: U, ledger: B, sessions: S) -> Result<()>
where
    U: UserStore + 'static,
    B: BookingLedger + 'static,
    S: SessionStore + 'static,
{
    let state = AppState::new(users, ledger, sessions).with_bcrypt_cost(config.bcrypt_cost);

    if config.seed_demo {
        let seeded = seed_demo_data(
            state.user_store.as_ref(),
            state.ledger.as_ref(),
            state.bcrypt_cost,
        )?;
        tracing::info!(seeded, "Demo seed finished");
    }

    // Create router
    let app = routes::create_router(Arc::new(state), config.request_timeout());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("MediQ listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
