use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::invoicing::store::{create_invoice, InvoiceNumbering};
use crate::ledger::entries;
use crate::models::invoice::CreateInvoice;
use crate::models::ledger_entry::{
    LedgerCategory, LedgerSource, LedgerStatus, LedgerTag, NewLedgerEntry, PaymentMode,
};
use crate::reconcile::checks::{deactivate_orphan_entries, relink_invoice_works};
use crate::sequence::SequenceScope;
use crate::test_support::{create_test_pool, insert_work, test_context};

#[tokio::test]
#[ignore] // Requires database setup
async fn test_orphan_entry_is_deactivated() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    let ctx = test_context();

    let mut conn = pool.acquire().await.unwrap();
    let orphan = entries::insert_entry(
        &mut conn,
        &NewLedgerEntry {
            id: Uuid::new_v4(),
            tag: LedgerTag::new(LedgerSource::FuelLog, LedgerCategory::Spending),
            source_id: Uuid::new_v4(),
            mode: PaymentMode::Cash,
            amount: Decimal::from(75),
            date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            status: LedgerStatus::Paid,
            employee_id: None,
            business_id: ctx.business_id,
            created_by: ctx.user_id,
        },
    )
    .await
    .unwrap();
    drop(conn);

    let repaired = deactivate_orphan_entries(&pool).await.unwrap();
    assert!(repaired >= 1);

    let entry = entries::get_entry(&pool, ctx.business_id, orphan.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!entry.is_active);

    // A second pass finds nothing new for this entry.
    deactivate_orphan_entries(&pool).await.unwrap();
    let entry = entries::get_entry(&pool, ctx.business_id, orphan.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!entry.is_active);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_unlinked_works_are_relinked() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    let ctx = test_context();
    let work = insert_work(&pool, &ctx, Decimal::from(800)).await.unwrap();

    let created = create_invoice(
        &pool,
        &ctx,
        InvoiceNumbering {
            scope: SequenceScope::Business,
            start: None,
        },
        CreateInvoice {
            works: vec![work],
            invoice_to: Uuid::new_v4(),
            invoice_to_name: "Green Acres".to_string(),
            invoice_from_name: "Harvest Services".to_string(),
            date: None,
            invoice_brief: None,
            discount: Decimal::ZERO,
            gst_percent: Decimal::ZERO,
            tds_percent: Decimal::ZERO,
            description: None,
            status: None,
            expected_clearance_date: None,
        },
    )
    .await
    .unwrap();

    // Simulate a lost linkage.
    sqlx::query("UPDATE works SET invoice_id = NULL, invoice_number = NULL WHERE id = $1")
        .bind(work)
        .execute(&pool)
        .await
        .unwrap();

    let relinked = relink_invoice_works(&pool).await.unwrap();
    assert!(relinked >= 1);

    let (invoice_id, invoice_number): (Option<Uuid>, Option<i64>) =
        sqlx::query_as("SELECT invoice_id, invoice_number FROM works WHERE id = $1")
            .bind(work)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(invoice_id, Some(created.invoice.id));
    assert_eq!(invoice_number, Some(created.invoice.invoice_number));
}
