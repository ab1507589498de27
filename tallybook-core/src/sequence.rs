//! Named monotonic counters backed by the `counters` table.
//!
//! Every increment is a single upsert statement, so concurrent callers on
//! the same counter serialize on the row lock and each receives a distinct
//! value. When called inside a transaction the row stays locked until commit;
//! a rollback therefore returns the number to the pool instead of leaving a
//! gap.

use std::fmt;
use std::str::FromStr;

use sqlx::Postgres;
use tracing::info;
use uuid::Uuid;

/// Counter used for invoice numbers.
pub const INVOICE_COUNTER: &str = "invoice";

/// Whether invoice numbers are shared by every business or issued per business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceScope {
    Global,
    Business,
}

impl FromStr for SequenceScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(SequenceScope::Global),
            "business" | "tenant" => Ok(SequenceScope::Business),
            other => Err(format!("unknown sequence scope: {}", other)),
        }
    }
}

impl fmt::Display for SequenceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceScope::Global => write!(f, "global"),
            SequenceScope::Business => write!(f, "business"),
        }
    }
}

/// Name of the invoice counter for a business under the given scope.
pub fn invoice_counter_name(scope: SequenceScope, business_id: Uuid) -> String {
    match scope {
        SequenceScope::Global => INVOICE_COUNTER.to_string(),
        SequenceScope::Business => format!("{}:{}", INVOICE_COUNTER, business_id),
    }
}

/// Atomically increments the named counter and returns the new value.
///
/// A missing counter is created with seed 0, so the first value issued is 1.
///
/// # Arguments
///
/// * `executor` - Database executor (pool or transaction)
/// * `name` - Counter identifier
///
/// # Errors
///
/// Returns an error if the upsert fails; callers must abort whatever they
/// were numbering.
pub async fn next_value<'a, E>(executor: E, name: &str) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'a, Database = Postgres>,
{
    let (seq,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO counters (id, seq)
        VALUES ($1, 1)
        ON CONFLICT (id) DO UPDATE SET seq = counters.seq + 1
        RETURNING seq
        "#,
    )
    .bind(name)
    .fetch_one(executor)
    .await?;

    Ok(seq)
}

/// Creates the counter at `start` unless it already exists.
///
/// Never lowers an existing counter. Returns `true` if the seed was applied.
pub async fn seed<'a, E>(executor: E, name: &str, start: i64) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'a, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO counters (id, seq)
        VALUES ($1, $2)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(start)
    .execute(executor)
    .await?;

    let applied = result.rows_affected() == 1;
    if applied {
        info!(counter = name, start, "Seeded counter");
    }
    Ok(applied)
}
