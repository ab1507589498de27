use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::ledger_entry::{
    LedgerCategory, LedgerEntry, LedgerInput, LedgerSource, LedgerStatus, NewLedgerEntry,
};
use crate::models::page::{self, Page, SortOrder};

/// Filters accepted by the ledger listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerFilter {
    pub source: Option<LedgerSource>,
    pub category: Option<LedgerCategory>,
    pub status: Option<LedgerStatus>,
    pub employee: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Defaults to active entries only
    pub active: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Inserts a new ledger entry. `updated_by` starts equal to `created_by`.
pub async fn insert_entry(
    conn: &mut PgConnection,
    entry: &NewLedgerEntry,
) -> Result<LedgerEntry, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        r#"
        INSERT INTO ledger_entries (
            id, source, category, source_id, mode, amount, date, status,
            employee_id, business_id, created_by, updated_by
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11
        )
        RETURNING *
        "#,
    )
    .bind(entry.id)
    .bind(entry.tag.source)
    .bind(entry.tag.category)
    .bind(entry.source_id)
    .bind(entry.mode)
    .bind(entry.amount)
    .bind(entry.date)
    .bind(entry.status)
    .bind(entry.employee_id)
    .bind(entry.business_id)
    .bind(entry.created_by)
    .fetch_one(conn)
    .await
}

/// Applies a value correction to an entry.
///
/// Only amount, mode, date and status can change; fields left as `None`
/// keep their stored value. The source link is never touched.
pub async fn update_entry_values(
    conn: &mut PgConnection,
    business_id: Uuid,
    id: Uuid,
    values: &LedgerInput,
    updated_by: Uuid,
) -> Result<Option<LedgerEntry>, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        r#"
        UPDATE ledger_entries
        SET
            amount = COALESCE($3, amount),
            mode = COALESCE($4, mode),
            date = COALESCE($5, date),
            status = COALESCE($6, status),
            updated_by = $7,
            updated_at = NOW()
        WHERE id = $1 AND business_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(business_id)
    .bind(values.amount)
    .bind(values.mode)
    .bind(values.date)
    .bind(values.status)
    .bind(updated_by)
    .fetch_optional(conn)
    .await
}

/// Soft-deletes an entry, optionally moving it to a final status.
pub async fn deactivate_entry(
    conn: &mut PgConnection,
    business_id: Uuid,
    id: Uuid,
    status: Option<LedgerStatus>,
    updated_by: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE ledger_entries
        SET is_active = FALSE, status = COALESCE($3, status), updated_by = $4, updated_at = NOW()
        WHERE id = $1 AND business_id = $2
        "#,
    )
    .bind(id)
    .bind(business_id)
    .bind(status)
    .bind(updated_by)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Loads an entry and locks its row for the rest of the transaction.
pub async fn get_entry_for_update(
    conn: &mut PgConnection,
    business_id: Uuid,
    id: Uuid,
) -> Result<Option<LedgerEntry>, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        "SELECT * FROM ledger_entries WHERE id = $1 AND business_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(business_id)
    .fetch_optional(conn)
    .await
}

pub async fn get_entry(
    pool: &PgPool,
    business_id: Uuid,
    id: Uuid,
) -> Result<Option<LedgerEntry>, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        "SELECT * FROM ledger_entries WHERE id = $1 AND business_id = $2",
    )
    .bind(id)
    .bind(business_id)
    .fetch_optional(pool)
    .await
}

/// Lists a business's ledger entries, newest first unless asked otherwise.
pub async fn list_entries(
    pool: &PgPool,
    business_id: Uuid,
    filter: &LedgerFilter,
) -> Result<Page<LedgerEntry>, sqlx::Error> {
    let (page, limit, offset) = page::normalize(filter.page, filter.limit);
    let active = filter.active.unwrap_or(true);

    const WHERE: &str = r#"
        WHERE business_id = $1
            AND is_active = $2
            AND ($3::varchar IS NULL OR source = $3)
            AND ($4::varchar IS NULL OR category = $4)
            AND ($5::varchar IS NULL OR status = $5)
            AND ($6::uuid IS NULL OR employee_id = $6)
            AND ($7::date IS NULL OR date >= $7)
            AND ($8::date IS NULL OR date <= $8)
    "#;

    let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM ledger_entries {}", WHERE))
        .bind(business_id)
        .bind(active)
        .bind(filter.source)
        .bind(filter.category)
        .bind(filter.status)
        .bind(filter.employee)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(pool)
        .await?;

    let order = filter.sort_order.as_sql();
    let sql = format!(
        "SELECT * FROM ledger_entries {} ORDER BY date {}, id {} LIMIT $9 OFFSET $10",
        WHERE, order, order
    );

    let docs = sqlx::query_as::<_, LedgerEntry>(&sql)
        .bind(business_id)
        .bind(active)
        .bind(filter.source)
        .bind(filter.category)
        .bind(filter.status)
        .bind(filter.employee)
        .bind(filter.from)
        .bind(filter.to)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(Page::new(docs, total, page, limit))
}
