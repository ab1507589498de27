use dotenv::dotenv;
use tallybook_core::config::AppConfig;
use tallybook_core::db;
use tallybook_core::reconcile::Reconciler;
use tokio::signal;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Background reconciler entry point.
///
/// Periodically deactivates ledger entries whose record no longer exists
/// and re-links invoice works that lost their linkage.
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

    info!("Starting Tallybook Reconciler...");

    let config = AppConfig::from_env()?;
    let db_pool = db::create_pool(&config).await?;

    let reconciler = Reconciler::new(db_pool, Some(config.reconcile_interval_seconds));
    let running = reconciler.stop_handle();

    let mut reconciler_handle = tokio::spawn(async move {
        if let Err(e) = reconciler.start().await {
            tracing::error!("Reconciler error: {}", e);
        }
    });

    let interrupted = tokio::select! {
        result = signal::ctrl_c() => {
            result?;
            info!("Received Ctrl+C, shutting down gracefully...");
            true
        }
        _ = &mut reconciler_handle => {
            info!("Reconciler task completed");
            false
        }
    };

    if interrupted {
        *running.write().await = false;
        // The loop may be sleeping for a full interval.
        reconciler_handle.abort();
    }

    info!("Tallybook Reconciler stopped");
    Ok(())
}
