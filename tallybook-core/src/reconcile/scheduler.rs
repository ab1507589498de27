use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{error, info};

use crate::reconcile::checks::{deactivate_orphan_entries, relink_invoice_works};

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub orphans_deactivated: u64,
    pub works_relinked: u64,
}

/// Periodic repair of ledger and invoice linkage.
///
/// Polls the database at a fixed interval and runs every check. A failing
/// check is logged and retried on the next pass.
pub struct Reconciler {
    /// Database connection pool
    pool: PgPool,

    /// Seconds between passes
    interval_seconds: u64,

    /// Whether the loop should keep running
    running: Arc<RwLock<bool>>,
}

impl Reconciler {
    /// Creates a new reconciler.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    /// * `interval_seconds` - Pause between passes (default: 300)
    pub fn new(pool: PgPool, interval_seconds: Option<u64>) -> Self {
        Self {
            pool,
            interval_seconds: interval_seconds.unwrap_or(300),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Handle that stops the loop after its current pass.
    pub fn stop_handle(&self) -> Arc<RwLock<bool>> {
        Arc::clone(&self.running)
    }

    /// Runs passes until stopped.
    pub async fn start(&self) -> Result<(), anyhow::Error> {
        *self.running.write().await = true;
        info!(
            "Reconciler started with interval: {} seconds",
            self.interval_seconds
        );

        while *self.running.read().await {
            match self.run_once().await {
                Ok(report) => {
                    if report != ReconcileReport::default() {
                        info!(
                            orphans_deactivated = report.orphans_deactivated,
                            works_relinked = report.works_relinked,
                            "Reconciliation pass repaired records"
                        );
                    }
                }
                Err(e) => {
                    error!("Error in reconciliation pass: {}", e);
                }
            }

            sleep(Duration::from_secs(self.interval_seconds)).await;
        }

        info!("Reconciler stopped");
        Ok(())
    }

    /// Runs every check once.
    pub async fn run_once(&self) -> Result<ReconcileReport, sqlx::Error> {
        let orphans_deactivated = deactivate_orphan_entries(&self.pool).await?;
        let works_relinked = relink_invoice_works(&self.pool).await?;
        Ok(ReconcileReport {
            orphans_deactivated,
            works_relinked,
        })
    }
}
