use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

use crate::auth::RequestContext;
use crate::error::AppError;
use crate::ledger::entries::{self, LedgerFilter};
use crate::ledger::linked::{
    build_entry, create_linked, delete_linked, get_linked, update_linked, LedgerLinked,
    LinkedPayload,
};
use crate::models::ledger_entry::{LedgerCategory, LedgerSource, LedgerStatus, PaymentMode};
use crate::models::{Borrowing, Expenditure, FuelLog, Revenue, Salary};
use crate::test_support::{create_test_pool, insert_employee, test_context};

fn payload<R: LedgerLinked>(value: serde_json::Value) -> LinkedPayload<R::Fields> {
    serde_json::from_value(value).expect("payload should parse")
}

#[test]
fn test_build_entry_applies_defaults() {
    let ctx = test_context();
    let record_id = uuid::Uuid::new_v4();
    let p = payload::<Expenditure>(json!({
        "_id": "client-supplied",
        "date": "2024-06-01",
        "purpose": "Diesel filter",
        "transaction": { "_id": "also-ignored", "amount": 320 }
    }));

    let entry = build_entry::<Expenditure>(record_id, &ctx, &p).unwrap();

    assert_eq!(entry.source_id, record_id);
    assert_ne!(entry.id, record_id);
    assert_eq!(entry.tag.source, LedgerSource::Expenditure);
    assert_eq!(entry.tag.category, LedgerCategory::Spending);
    assert_eq!(entry.mode, PaymentMode::Cash);
    assert_eq!(entry.status, LedgerStatus::Paid);
    assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    assert_eq!(entry.amount, Decimal::new(320, 0));
    assert_eq!(entry.business_id, ctx.business_id);
    assert_eq!(entry.created_by, ctx.user_id);
}

#[test]
fn test_build_entry_requires_amount() {
    let p = payload::<Revenue>(json!({ "date": "2024-06-01" }));
    let err = build_entry::<Revenue>(uuid::Uuid::new_v4(), &test_context(), &p).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn test_build_entry_rejects_negative_amount() {
    let p = payload::<Revenue>(json!({
        "date": "2024-06-01",
        "transaction": { "amount": -5 }
    }));
    let err = build_entry::<Revenue>(uuid::Uuid::new_v4(), &test_context(), &p).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn test_build_entry_keeps_explicit_ledger_fields() {
    let p = payload::<FuelLog>(json!({
        "date": "2024-06-01",
        "fuel": "DIESEL",
        "petrolPump": "8c1b7f7e-5d0b-4c38-9f4f-3b1f0d8e9a10",
        "rate": 90.5,
        "volume": 20,
        "total": 1810,
        "employee": "8c1b7f7e-5d0b-4c38-9f4f-3b1f0d8e9a11",
        "transaction": {
            "amount": 1810,
            "mode": "UPI",
            "status": "PDC",
            "date": "2024-06-03"
        }
    }));

    let entry = build_entry::<FuelLog>(uuid::Uuid::new_v4(), &test_context(), &p).unwrap();
    assert_eq!(entry.tag.source, LedgerSource::FuelLog);
    assert_eq!(entry.mode, PaymentMode::Upi);
    assert_eq!(entry.status, LedgerStatus::Pdc);
    assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    assert_eq!(entry.employee_id, Some(p.fields.employee.unwrap()));
}

/// Checks both halves of the pointer pair for one created record.
async fn assert_linked<R: LedgerLinked>(
    pool: &PgPool,
    ctx: &RequestContext,
    record: &R,
    source: LedgerSource,
    category: LedgerCategory,
) {
    let entry = entries::get_entry(pool, ctx.business_id, record.transaction_id())
        .await
        .expect("query should succeed")
        .expect("ledger entry should exist");
    assert_eq!(entry.source_id, record.id());
    assert_eq!(entry.source, source);
    assert_eq!(entry.category, category);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_every_kind_links_both_ways() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    let ctx = test_context();
    let employee = insert_employee(&pool, &ctx, Some(Decimal::new(500, 0)))
        .await
        .unwrap();

    let borrowed = create_linked::<Borrowing>(
        &pool,
        &ctx,
        payload::<Borrowing>(json!({
            "date": "2024-06-01",
            "type": "BORROWED",
            "purpose": "Seed purchase",
            "transaction": { "amount": 5000 }
        })),
    )
    .await
    .unwrap();
    assert_linked(&pool, &ctx, &borrowed.result, LedgerSource::Borrowed, LedgerCategory::Borrowing).await;

    let lent = create_linked::<Borrowing>(
        &pool,
        &ctx,
        payload::<Borrowing>(json!({
            "date": "2024-06-01",
            "type": "LENT",
            "purpose": "Advance to neighbour",
            "transaction": { "amount": 700 }
        })),
    )
    .await
    .unwrap();
    assert_linked(&pool, &ctx, &lent.result, LedgerSource::Lend, LedgerCategory::Lending).await;

    let expenditure = create_linked::<Expenditure>(
        &pool,
        &ctx,
        payload::<Expenditure>(json!({
            "date": "2024-06-02",
            "purpose": "Tyre puncture",
            "employee": employee,
            "transaction": { "amount": 150 }
        })),
    )
    .await
    .unwrap();
    assert_linked(&pool, &ctx, &expenditure.result, LedgerSource::Expenditure, LedgerCategory::Spending).await;
    assert_eq!(expenditure.transaction.employee_id, Some(employee));

    let fuel = create_linked::<FuelLog>(
        &pool,
        &ctx,
        payload::<FuelLog>(json!({
            "date": "2024-06-02",
            "fuel": "DIESEL",
            "petrolPump": uuid::Uuid::new_v4(),
            "rate": 90,
            "volume": 10,
            "total": 900,
            "transaction": { "amount": 900 }
        })),
    )
    .await
    .unwrap();
    assert_linked(&pool, &ctx, &fuel.result, LedgerSource::FuelLog, LedgerCategory::Spending).await;

    let revenue = create_linked::<Revenue>(
        &pool,
        &ctx,
        payload::<Revenue>(json!({
            "date": "2024-06-03",
            "source": "FARM_INCOME",
            "transaction": { "amount": 12000 }
        })),
    )
    .await
    .unwrap();
    assert_linked(&pool, &ctx, &revenue.result, LedgerSource::FarmIncome, LedgerCategory::Income).await;

    let salary = create_linked::<Salary>(
        &pool,
        &ctx,
        payload::<Salary>(json!({
            "employee": employee,
            "date": "2024-06-05",
            "totalPayable": 1500,
            "amountPaid": 1500,
            "paidDates": ["2024-06-01", "2024-06-02", "2024-06-03"],
            "transaction": { "mode": "UPI" }
        })),
    )
    .await
    .unwrap();
    assert_linked(&pool, &ctx, &salary.result, LedgerSource::EmployeePayment, LedgerCategory::Spending).await;
    assert_eq!(salary.transaction.amount, Decimal::new(1500, 0));
    assert_eq!(salary.result.paid_to_date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    assert_eq!(salary.result.total_paid_days, 3);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_failed_record_insert_leaves_no_entry() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    let ctx = test_context();

    // Unknown employee violates the salaries foreign key after the entry is written.
    let result = create_linked::<Salary>(
        &pool,
        &ctx,
        payload::<Salary>(json!({
            "employee": uuid::Uuid::new_v4(),
            "date": "2024-06-05",
            "totalPayable": 100,
            "amountPaid": 100
        })),
    )
    .await;
    assert!(matches!(result, Err(AppError::Database(_))));

    let page = entries::list_entries(&pool, ctx.business_id, &LedgerFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_update_corrects_entry_and_rejects_retag() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    let ctx = test_context();

    let created = create_linked::<Borrowing>(
        &pool,
        &ctx,
        payload::<Borrowing>(json!({
            "date": "2024-06-01",
            "type": "BORROWED",
            "purpose": "Pump motor",
            "transaction": { "amount": 2000 }
        })),
    )
    .await
    .unwrap();
    let id = created.result.id;

    let updated = update_linked::<Borrowing>(
        &pool,
        &ctx,
        id,
        payload::<Borrowing>(json!({
            "date": "2024-06-04",
            "type": "BORROWED",
            "purpose": "Pump motor and pipes",
            "transaction": { "amount": 2600, "status": "PARTIALLY_PAID" }
        })),
    )
    .await
    .unwrap();
    assert_eq!(updated.transaction.id, created.transaction.id);
    assert_eq!(updated.transaction.amount, Decimal::new(2600, 0));
    assert_eq!(updated.transaction.status, LedgerStatus::PartiallyPaid);
    assert_eq!(updated.transaction.date, NaiveDate::from_ymd_opt(2024, 6, 4).unwrap());
    assert_eq!(updated.result.purpose, "Pump motor and pipes");

    let retag = update_linked::<Borrowing>(
        &pool,
        &ctx,
        id,
        payload::<Borrowing>(json!({
            "date": "2024-06-04",
            "type": "LENT",
            "purpose": "Pump motor",
            "transaction": {}
        })),
    )
    .await;
    assert!(matches!(retag, Err(AppError::Validation(_))));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_delete_deactivates_record_and_entry() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    let ctx = test_context();

    let created = create_linked::<Revenue>(
        &pool,
        &ctx,
        payload::<Revenue>(json!({
            "date": "2024-06-03",
            "transaction": { "amount": 400 }
        })),
    )
    .await
    .unwrap();

    delete_linked::<Revenue>(&pool, &ctx, created.result.id).await.unwrap();

    let entry = entries::get_entry(&pool, ctx.business_id, created.transaction.id)
        .await
        .unwrap()
        .expect("entry is kept for audit");
    assert!(!entry.is_active);

    let gone = get_linked::<Revenue>(&pool, &ctx, created.result.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_records_are_scoped_to_business() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    let owner = test_context();
    let other = test_context();

    let created = create_linked::<Revenue>(
        &pool,
        &owner,
        payload::<Revenue>(json!({
            "date": "2024-06-03",
            "transaction": { "amount": 50 }
        })),
    )
    .await
    .unwrap();

    let result = get_linked::<Revenue>(&pool, &other, created.result.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
