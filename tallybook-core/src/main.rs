use std::sync::Arc;

use dotenv::dotenv;
use tallybook_core::config::AppConfig;
use tallybook_core::routes::create_router;
use tallybook_core::{db, AppState};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(LevelFilter::INFO.into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("Starting Tallybook Core Server...");

    let config = AppConfig::from_env()?;

    // Initialize database connection pool
    let db_pool = db::create_pool(&config).await?;

    if config.run_migrations {
        db::run_migrations(&db_pool).await?;
    }

    info!(
        scope = %config.invoice_scope,
        start = ?config.invoice_sequence_start,
        "Invoice numbering configured"
    );

    let addr = format!("{}:{}", config.host, config.port);

    // Create application state
    let app_state = AppState {
        db: db_pool,
        config: Arc::new(config),
    };

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
