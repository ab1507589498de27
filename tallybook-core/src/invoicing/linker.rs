use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;

use crate::models::Invoice;

/// Stamps the invoice id and number on every work the invoice bills.
///
/// Returns the number of works updated. Works billed on a different invoice
/// are left alone; works already carrying this invoice are rewritten with
/// the same values, so repeated calls are safe.
pub async fn link_works_to_invoice(
    conn: &mut PgConnection,
    invoice: &Invoice,
) -> Result<u64, sqlx::Error> {
    if invoice.works.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"
        UPDATE works
        SET invoice_id = $1, invoice_number = $2, updated_by = $3, updated_at = NOW()
        WHERE id = ANY($4)
            AND business_id = $5
            AND (invoice_id IS NULL OR invoice_id = $1)
        "#,
    )
    .bind(invoice.id)
    .bind(invoice.invoice_number)
    .bind(invoice.updated_by)
    .bind(&invoice.works)
    .bind(invoice.business_id)
    .execute(conn)
    .await?;

    info!(
        invoice_id = %invoice.id,
        invoice_number = invoice.invoice_number,
        linked = result.rows_affected(),
        "Linked works to invoice"
    );
    Ok(result.rows_affected())
}

/// Clears the invoice linkage from works so they can be billed again.
pub async fn unlink_works(
    conn: &mut PgConnection,
    business_id: Uuid,
    invoice_id: Uuid,
    updated_by: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE works
        SET invoice_id = NULL, invoice_number = NULL, updated_by = $3, updated_at = NOW()
        WHERE invoice_id = $1 AND business_id = $2
        "#,
    )
    .bind(invoice_id)
    .bind(business_id)
    .bind(updated_by)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
