use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::invoicing::link_works_to_invoice;
use crate::models::ledger_entry::LedgerSource;
use crate::models::Invoice;

/// Sources whose entries are owned by a record table.
const OWNED_SOURCES: [LedgerSource; 8] = [
    LedgerSource::Invoice,
    LedgerSource::EmployeePayment,
    LedgerSource::FuelLog,
    LedgerSource::FarmIncome,
    LedgerSource::OtherIncome,
    LedgerSource::Expenditure,
    LedgerSource::Borrowed,
    LedgerSource::Lend,
];

/// Deactivates active ledger entries whose owning record does not exist.
///
/// Only committed rows are visible here, so an entry being co-created in an
/// open transaction is never mistaken for an orphan.
pub async fn deactivate_orphan_entries(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let mut total = 0;

    for source in OWNED_SOURCES {
        let Some(table) = source.owner_table() else {
            continue;
        };

        let sql = format!(
            r#"
            UPDATE ledger_entries le
            SET is_active = FALSE, updated_at = NOW()
            WHERE le.is_active = TRUE
                AND le.source = $1
                AND NOT EXISTS (SELECT 1 FROM {} r WHERE r.id = le.source_id)
            RETURNING le.id, le.source_id, le.business_id
            "#,
            table
        );

        let repaired: Vec<(Uuid, Uuid, Uuid)> = sqlx::query_as(&sql)
            .bind(source)
            .fetch_all(pool)
            .await?;

        for (entry_id, source_id, business_id) in &repaired {
            warn!(
                ledger_id = %entry_id,
                source = ?source,
                source_id = %source_id,
                business_id = %business_id,
                "Deactivated orphan ledger entry"
            );
        }
        total += repaired.len() as u64;
    }

    Ok(total)
}

/// Re-applies work linkage for active invoices with unlinked works.
///
/// Returns the number of works updated across all invoices.
pub async fn relink_invoice_works(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let invoices = sqlx::query_as::<_, Invoice>(
        r#"
        SELECT i.* FROM invoices i
        WHERE i.is_active = TRUE
            AND EXISTS (
                SELECT 1 FROM works w
                WHERE w.id = ANY(i.works)
                    AND w.business_id = i.business_id
                    AND w.invoice_id IS NULL
            )
        ORDER BY i.invoice_number
        LIMIT 100
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut total = 0;
    for invoice in &invoices {
        let mut tx = pool.begin().await?;
        let linked = link_works_to_invoice(&mut tx, invoice).await?;
        tx.commit().await?;

        info!(
            invoice_id = %invoice.id,
            invoice_number = invoice.invoice_number,
            linked,
            "Relinked invoice works"
        );
        total += linked;
    }

    Ok(total)
}
