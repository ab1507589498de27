//! Bookkeeping backend for small businesses.
//!
//! Records that move money (borrowings, expenditures, fuel logs, revenues,
//! salaries and invoices) are each paired with one ledger entry. Invoices are
//! numbered from an atomic counter and salaries are accrued from attendance.

use std::sync::Arc;

use sqlx::PgPool;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod invoicing;
pub mod ledger;
pub mod models;
pub mod payroll;
pub mod reconcile;
pub mod routes;
pub mod sequence;

#[cfg(test)]
mod test_support;

use config::AppConfig;

/// Application state containing shared resources.
///
/// Holds the database connection pool and the loaded configuration; cloned
/// into every handler.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub db: PgPool,

    pub config: Arc<AppConfig>,
}
