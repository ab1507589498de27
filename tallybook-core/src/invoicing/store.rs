use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::invoicing::amounts::{self, InvoiceAmounts};
use crate::invoicing::linker::{link_works_to_invoice, unlink_works};
use crate::ledger::entries;
use crate::models::invoice::{CreateInvoice, StatusChange, UpdateInvoice};
use crate::models::ledger_entry::{
    LedgerCategory, LedgerInput, LedgerSource, LedgerStatus, LedgerTag, NewLedgerEntry,
    PaymentMode,
};
use crate::models::{Invoice, LedgerEntry, Work};
use crate::sequence::{self, SequenceScope};

/// Tag stamped on the ledger entry of every invoice.
pub const INVOICE_TAG: LedgerTag = LedgerTag::new(LedgerSource::Invoice, LedgerCategory::Income);

/// How invoice numbers are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceNumbering {
    pub scope: SequenceScope,
    /// Seed applied the first time a counter is used
    pub start: Option<i64>,
}

impl From<&AppConfig> for InvoiceNumbering {
    fn from(config: &AppConfig) -> Self {
        Self {
            scope: config.invoice_scope,
            start: config.invoice_sequence_start,
        }
    }
}

/// Result of a successful invoice creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCreated {
    pub invoice: Invoice,
    pub transaction: LedgerEntry,
    pub linked_works: u64,
}

/// An invoice with its ledger entry and billed works.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub transaction: Option<LedgerEntry>,
    pub works: Vec<Work>,
}

fn validate_works(works: &[Uuid]) -> Result<(), AppError> {
    if works.is_empty() {
        return Err(AppError::Validation(
            "an invoice must bill at least one work".to_string(),
        ));
    }
    let unique: HashSet<&Uuid> = works.iter().collect();
    if unique.len() != works.len() {
        return Err(AppError::Validation(
            "works must not contain duplicates".to_string(),
        ));
    }
    Ok(())
}

/// Locks the listed works and checks they can be billed.
async fn lock_billable_works(
    conn: &mut PgConnection,
    business_id: Uuid,
    ids: &[Uuid],
) -> Result<Vec<Work>, AppError> {
    let works = sqlx::query_as::<_, Work>(
        r#"
        SELECT * FROM works
        WHERE id = ANY($1) AND business_id = $2 AND is_active = TRUE
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(ids)
    .bind(business_id)
    .fetch_all(&mut *conn)
    .await?;

    if works.len() != ids.len() {
        let found: HashSet<Uuid> = works.iter().map(|w| w.id).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(Uuid::to_string)
            .collect();
        return Err(AppError::Validation(format!(
            "unknown works: {}",
            missing.join(", ")
        )));
    }

    if let Some(billed) = works.iter().find(|w| w.invoice_id.is_some()) {
        return Err(AppError::Conflict(format!(
            "work {} is already billed on invoice {}",
            billed.id,
            billed.invoice_number.unwrap_or_default()
        )));
    }

    Ok(works)
}

async fn fetch_invoice(
    conn: &mut PgConnection,
    business_id: Uuid,
    id: Uuid,
    lock: bool,
) -> Result<Option<Invoice>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM invoices WHERE id = $1 AND business_id = $2 AND is_active = TRUE{}",
        if lock { " FOR UPDATE" } else { "" }
    );
    sqlx::query_as::<_, Invoice>(&sql)
        .bind(id)
        .bind(business_id)
        .fetch_optional(conn)
        .await
}

/// Creates an invoice, its ledger entry and the work linkage in one transaction.
///
/// The invoice number is drawn inside the same transaction, so a failed
/// creation never consumes a number.
///
/// # Errors
///
/// * `Validation` - empty or duplicate works, unknown works, bad rates
/// * `Conflict` - a listed work is already billed
/// * `Database` - counter or write failure; nothing is persisted
pub async fn create_invoice(
    pool: &PgPool,
    ctx: &RequestContext,
    numbering: InvoiceNumbering,
    payload: CreateInvoice,
) -> Result<InvoiceCreated, AppError> {
    validate_works(&payload.works)?;
    amounts::validate_rates(payload.discount, payload.gst_percent, payload.tds_percent)?;

    let mut tx = pool.begin().await?;

    let works = lock_billable_works(&mut tx, ctx.business_id, &payload.works).await?;
    let subtotal: Decimal = works.iter().map(|w| w.total).sum();
    let InvoiceAmounts {
        subtotal,
        discount,
        gst_amount,
        tds_amount,
        invoiced_amount,
    } = amounts::compute(subtotal, payload.discount, payload.gst_percent, payload.tds_percent);

    let counter = sequence::invoice_counter_name(numbering.scope, ctx.business_id);
    if let Some(start) = numbering.start {
        sequence::seed(&mut *tx, &counter, start).await?;
    }
    let invoice_number = sequence::next_value(&mut *tx, &counter).await?;

    let status = payload.status.unwrap_or_default();
    let history = vec![StatusChange {
        status,
        changed_by: ctx.user_id,
        changed_at: Utc::now(),
    }];
    let date = payload.date.unwrap_or_else(|| Utc::now().date_naive());

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        INSERT INTO invoices (
            id, invoice_number, works, invoice_to, invoice_to_name, invoice_from_name,
            business_id, date, invoice_brief, subtotal, discount, gst_percent, gst_amount,
            tds_percent, tds_amount, invoiced_amount, description, status,
            expected_clearance_date, status_history, created_by, updated_by
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
            $14, $15, $16, $17, $18, $19, $20, $21, $21
        )
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(invoice_number)
    .bind(&payload.works)
    .bind(payload.invoice_to)
    .bind(&payload.invoice_to_name)
    .bind(&payload.invoice_from_name)
    .bind(ctx.business_id)
    .bind(date)
    .bind(&payload.invoice_brief)
    .bind(subtotal)
    .bind(discount)
    .bind(payload.gst_percent)
    .bind(gst_amount)
    .bind(payload.tds_percent)
    .bind(tds_amount)
    .bind(invoiced_amount)
    .bind(&payload.description)
    .bind(status)
    .bind(payload.expected_clearance_date)
    .bind(Json(history))
    .bind(ctx.user_id)
    .fetch_one(&mut *tx)
    .await?;

    let transaction = entries::insert_entry(
        &mut tx,
        &NewLedgerEntry {
            id: Uuid::new_v4(),
            tag: INVOICE_TAG,
            source_id: invoice.id,
            mode: PaymentMode::Cheque,
            amount: invoiced_amount,
            date,
            status: LedgerStatus::Scheduled,
            employee_id: None,
            business_id: ctx.business_id,
            created_by: ctx.user_id,
        },
    )
    .await?;

    let invoice = sqlx::query_as::<_, Invoice>(
        "UPDATE invoices SET transaction_id = $2 WHERE id = $1 RETURNING *",
    )
    .bind(invoice.id)
    .bind(transaction.id)
    .fetch_one(&mut *tx)
    .await?;

    let linked_works = link_works_to_invoice(&mut tx, &invoice).await?;

    tx.commit().await?;

    info!(
        invoice_id = %invoice.id,
        invoice_number,
        ledger_id = %transaction.id,
        business_id = %ctx.business_id,
        "Created invoice"
    );

    Ok(InvoiceCreated {
        invoice,
        transaction,
        linked_works,
    })
}

/// Loads an active invoice with its ledger entry and billed works.
pub async fn get_invoice(
    pool: &PgPool,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<InvoiceDetail, AppError> {
    let mut conn = pool.acquire().await?;
    let invoice = fetch_invoice(&mut conn, ctx.business_id, id, false)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("invoice {}", id)))?;

    let transaction = match invoice.transaction_id {
        Some(entry_id) => entries::get_entry(pool, ctx.business_id, entry_id).await?,
        None => None,
    };

    let works = sqlx::query_as::<_, Work>(
        "SELECT * FROM works WHERE id = ANY($1) AND business_id = $2 ORDER BY date, id",
    )
    .bind(&invoice.works)
    .bind(ctx.business_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(InvoiceDetail {
        invoice,
        transaction,
        works,
    })
}

/// Updates the mutable invoice fields and keeps the ledger amount in step.
///
/// The invoice number and billed works never change. A new status is
/// appended to the status history.
pub async fn update_invoice(
    pool: &PgPool,
    ctx: &RequestContext,
    id: Uuid,
    payload: UpdateInvoice,
) -> Result<(Invoice, Option<LedgerEntry>), AppError> {
    let mut tx = pool.begin().await?;

    let current = fetch_invoice(&mut tx, ctx.business_id, id, true)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("invoice {}", id)))?;

    let discount = payload.discount.unwrap_or(current.discount);
    let gst_percent = payload.gst_percent.unwrap_or(current.gst_percent);
    let tds_percent = payload.tds_percent.unwrap_or(current.tds_percent);
    amounts::validate_rates(discount, gst_percent, tds_percent)?;
    let computed = amounts::compute(current.subtotal, discount, gst_percent, tds_percent);

    let status = payload.status.unwrap_or(current.status);
    let mut history = current.status_history.0.clone();
    if status != current.status {
        history.push(StatusChange {
            status,
            changed_by: ctx.user_id,
            changed_at: Utc::now(),
        });
    }

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices
        SET
            status = $3,
            description = COALESCE($4, description),
            invoice_brief = COALESCE($5, invoice_brief),
            expected_clearance_date = COALESCE($6, expected_clearance_date),
            discount = $7,
            gst_percent = $8,
            gst_amount = $9,
            tds_percent = $10,
            tds_amount = $11,
            invoiced_amount = $12,
            status_history = $13,
            updated_by = $14,
            updated_at = NOW()
        WHERE id = $1 AND business_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(ctx.business_id)
    .bind(status)
    .bind(&payload.description)
    .bind(&payload.invoice_brief)
    .bind(payload.expected_clearance_date)
    .bind(computed.discount)
    .bind(gst_percent)
    .bind(computed.gst_amount)
    .bind(tds_percent)
    .bind(computed.tds_amount)
    .bind(computed.invoiced_amount)
    .bind(Json(history))
    .bind(ctx.user_id)
    .fetch_one(&mut *tx)
    .await?;

    let transaction = match invoice.transaction_id {
        Some(entry_id) => {
            let values = LedgerInput {
                amount: Some(computed.invoiced_amount),
                ..Default::default()
            };
            entries::update_entry_values(&mut tx, ctx.business_id, entry_id, &values, ctx.user_id)
                .await?
        }
        None => None,
    };

    tx.commit().await?;

    info!(invoice_id = %id, status = ?invoice.status, "Updated invoice");
    Ok((invoice, transaction))
}

/// Soft-deletes an invoice, cancels its ledger entry and releases its works.
///
/// The invoice number stays consumed.
pub async fn delete_invoice(
    pool: &PgPool,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<Invoice, AppError> {
    let mut tx = pool.begin().await?;

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices
        SET is_active = FALSE, updated_by = $3, updated_at = NOW()
        WHERE id = $1 AND business_id = $2 AND is_active = TRUE
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(ctx.business_id)
    .bind(ctx.user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("invoice {}", id)))?;

    if let Some(entry_id) = invoice.transaction_id {
        entries::deactivate_entry(
            &mut tx,
            ctx.business_id,
            entry_id,
            Some(LedgerStatus::Canceled),
            ctx.user_id,
        )
        .await?;
    }
    let released = unlink_works(&mut tx, ctx.business_id, invoice.id, ctx.user_id).await?;

    tx.commit().await?;

    info!(
        invoice_id = %id,
        invoice_number = invoice.invoice_number,
        released,
        "Deleted invoice"
    );
    Ok(invoice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceStatus;

    #[test]
    fn test_empty_works_rejected() {
        assert!(matches!(validate_works(&[]), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_duplicate_works_rejected() {
        let id = Uuid::new_v4();
        assert!(matches!(
            validate_works(&[id, Uuid::new_v4(), id]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_invoice_tag() {
        assert_eq!(INVOICE_TAG.source, LedgerSource::Invoice);
        assert_eq!(INVOICE_TAG.category, LedgerCategory::Income);
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Defined);
    }
}
