//! Co-creation of a domain record and its ledger entry.
//!
//! The record id is generated before anything is written so the entry can
//! point at it; the entry is written first and the record stores the entry id
//! back. Both writes share one transaction, so callers never observe an entry
//! without its record or the reverse.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::AppError;
use crate::ledger::entries;
use crate::models::ledger_entry::{LedgerEntry, LedgerInput, LedgerTag, NewLedgerEntry};

/// A domain record that owns exactly one ledger entry.
#[async_trait]
pub trait LedgerLinked:
    Serialize + for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static
{
    /// Record-specific payload fields.
    type Fields: DeserializeOwned + Send + Sync + 'static;

    /// Table holding the records.
    const TABLE: &'static str;

    /// Subject used in response messages, e.g. "Fuel information".
    const LABEL: &'static str;

    fn ledger_tag(fields: &Self::Fields) -> LedgerTag;

    /// Business date of the record; the entry date falls back to it.
    fn record_date(fields: &Self::Fields) -> NaiveDate;

    fn ledger_amount(_fields: &Self::Fields, input: &LedgerInput) -> Option<Decimal> {
        input.amount
    }

    fn ledger_employee(_fields: &Self::Fields) -> Option<Uuid> {
        None
    }

    fn validate(_fields: &Self::Fields) -> Result<(), AppError> {
        Ok(())
    }

    fn id(&self) -> Uuid;

    fn transaction_id(&self) -> Uuid;

    async fn insert(
        conn: &mut PgConnection,
        id: Uuid,
        ctx: &RequestContext,
        transaction_id: Uuid,
        fields: &Self::Fields,
    ) -> Result<Self, sqlx::Error>;

    async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        ctx: &RequestContext,
        fields: &Self::Fields,
    ) -> Result<Self, sqlx::Error>;
}

/// Create/update payload: record fields plus the nested `transaction` object.
///
/// Unknown keys such as a client-supplied `_id` are dropped during parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkedPayload<F> {
    #[serde(default)]
    pub transaction: LedgerInput,
    #[serde(flatten)]
    pub fields: F,
}

/// A record together with its resolved ledger entry.
#[derive(Debug, Clone, Serialize)]
pub struct Linked<R> {
    pub result: R,
    pub transaction: LedgerEntry,
}

fn check_amount(amount: Decimal) -> Result<Decimal, AppError> {
    if amount < Decimal::ZERO {
        return Err(AppError::Validation(
            "transaction amount must not be negative".to_string(),
        ));
    }
    Ok(amount)
}

/// Builds the ledger entry for a record that is about to be created.
pub fn build_entry<R: LedgerLinked>(
    record_id: Uuid,
    ctx: &RequestContext,
    payload: &LinkedPayload<R::Fields>,
) -> Result<NewLedgerEntry, AppError> {
    let amount = R::ledger_amount(&payload.fields, &payload.transaction)
        .ok_or_else(|| AppError::Validation("transaction.amount is required".to_string()))?;

    Ok(NewLedgerEntry {
        id: Uuid::new_v4(),
        tag: R::ledger_tag(&payload.fields),
        source_id: record_id,
        mode: payload.transaction.mode.unwrap_or_default(),
        amount: check_amount(amount)?,
        date: payload
            .transaction
            .date
            .unwrap_or_else(|| R::record_date(&payload.fields)),
        status: payload.transaction.status.unwrap_or_default(),
        employee_id: R::ledger_employee(&payload.fields),
        business_id: ctx.business_id,
        created_by: ctx.user_id,
    })
}

/// Ledger value corrections derived from an update payload.
fn correction_values<R: LedgerLinked>(
    payload: &LinkedPayload<R::Fields>,
) -> Result<LedgerInput, AppError> {
    let amount = R::ledger_amount(&payload.fields, &payload.transaction)
        .map(check_amount)
        .transpose()?;

    Ok(LedgerInput {
        amount,
        mode: payload.transaction.mode,
        date: Some(
            payload
                .transaction
                .date
                .unwrap_or_else(|| R::record_date(&payload.fields)),
        ),
        status: payload.transaction.status,
    })
}

async fn fetch_record<R: LedgerLinked>(
    conn: &mut PgConnection,
    business_id: Uuid,
    id: Uuid,
    lock: bool,
) -> Result<Option<R>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM {} WHERE id = $1 AND business_id = $2 AND is_active = TRUE{}",
        R::TABLE,
        if lock { " FOR UPDATE" } else { "" }
    );
    sqlx::query_as::<_, R>(&sql)
        .bind(id)
        .bind(business_id)
        .fetch_optional(conn)
        .await
}

/// Creates a record and its ledger entry atomically.
///
/// # Errors
///
/// Returns `Validation` for bad payloads and `Database` if either write
/// fails; in that case nothing is persisted.
pub async fn create_linked<R: LedgerLinked>(
    pool: &PgPool,
    ctx: &RequestContext,
    payload: LinkedPayload<R::Fields>,
) -> Result<Linked<R>, AppError> {
    R::validate(&payload.fields)?;

    let record_id = Uuid::new_v4();
    let new_entry = build_entry::<R>(record_id, ctx, &payload)?;

    let mut tx = pool.begin().await?;
    let transaction = entries::insert_entry(&mut tx, &new_entry).await?;
    let result = R::insert(&mut tx, record_id, ctx, transaction.id, &payload.fields).await?;
    tx.commit().await?;

    info!(
        table = R::TABLE,
        record_id = %result.id(),
        ledger_id = %transaction.id,
        business_id = %ctx.business_id,
        "Created record with ledger entry"
    );

    Ok(Linked {
        result,
        transaction,
    })
}

/// Corrects the linked ledger entry and then the record, atomically.
///
/// The entry's source and category are immutable: a payload that would
/// retag the entry (e.g. switching a borrowing to a loan) is rejected.
pub async fn update_linked<R: LedgerLinked>(
    pool: &PgPool,
    ctx: &RequestContext,
    id: Uuid,
    payload: LinkedPayload<R::Fields>,
) -> Result<Linked<R>, AppError> {
    R::validate(&payload.fields)?;
    let values = correction_values::<R>(&payload)?;

    let mut tx = pool.begin().await?;

    let existing = fetch_record::<R>(&mut tx, ctx.business_id, id, true)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", R::TABLE, id)))?;

    let entry = entries::get_entry_for_update(&mut tx, ctx.business_id, existing.transaction_id())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ledger entry for {} {}", R::TABLE, id)))?;

    if entry.tag() != R::ledger_tag(&payload.fields) {
        return Err(AppError::Validation(format!(
            "ledger source {:?}/{:?} of an existing record cannot change",
            entry.source, entry.category
        )));
    }

    let transaction =
        entries::update_entry_values(&mut tx, ctx.business_id, entry.id, &values, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("ledger entry {}", entry.id)))?;
    let result = R::update(&mut tx, id, ctx, &payload.fields).await?;

    tx.commit().await?;

    info!(
        table = R::TABLE,
        record_id = %id,
        ledger_id = %transaction.id,
        "Updated record and ledger entry"
    );

    Ok(Linked {
        result,
        transaction,
    })
}

/// Loads an active record and resolves its ledger entry.
pub async fn get_linked<R: LedgerLinked>(
    pool: &PgPool,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<Linked<R>, AppError> {
    let mut conn = pool.acquire().await?;

    let result = fetch_record::<R>(&mut conn, ctx.business_id, id, false)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", R::TABLE, id)))?;

    let transaction = entries::get_entry(pool, ctx.business_id, result.transaction_id())
        .await?
        .ok_or_else(|| {
            warn!(table = R::TABLE, record_id = %id, "Record points at a missing ledger entry");
            AppError::NotFound(format!("ledger entry for {} {}", R::TABLE, id))
        })?;

    Ok(Linked {
        result,
        transaction,
    })
}

/// Soft-deletes a record together with its ledger entry.
pub async fn delete_linked<R: LedgerLinked>(
    pool: &PgPool,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<R, AppError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        r#"
        UPDATE {}
        SET is_active = FALSE, updated_by = $3, updated_at = NOW()
        WHERE id = $1 AND business_id = $2 AND is_active = TRUE
        RETURNING *
        "#,
        R::TABLE
    );
    let record = sqlx::query_as::<_, R>(&sql)
        .bind(id)
        .bind(ctx.business_id)
        .bind(ctx.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", R::TABLE, id)))?;

    entries::deactivate_entry(
        &mut tx,
        ctx.business_id,
        record.transaction_id(),
        None,
        ctx.user_id,
    )
    .await?;

    tx.commit().await?;

    info!(table = R::TABLE, record_id = %id, "Deactivated record and ledger entry");
    Ok(record)
}
