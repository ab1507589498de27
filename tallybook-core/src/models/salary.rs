use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::AppError;
use crate::ledger::LedgerLinked;
use crate::models::ledger_entry::{LedgerCategory, LedgerInput, LedgerSource, LedgerTag};

/// One salary payment to an employee.
///
/// `balance_due` and `advanced_paid` are never both non-zero; the table
/// carries a CHECK constraint for it as well.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Salary {
    pub id: Uuid,
    #[serde(rename = "employee")]
    pub employee_id: Uuid,
    #[serde(rename = "transaction")]
    pub transaction_id: Uuid,
    pub date: NaiveDate,
    pub total_paid_days: i32,
    pub total_payable: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub advanced_paid: Decimal,
    pub paid_dates: Vec<NaiveDate>,
    /// Last day covered by this payment
    pub paid_to_date: NaiveDate,
    pub remarks: Option<String>,
    #[serde(rename = "business")]
    pub business_id: Uuid,
    #[serde(rename = "active")]
    pub is_active: bool,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryFields {
    pub employee: Uuid,
    pub date: NaiveDate,
    pub total_paid_days: Option<i32>,
    pub total_payable: Decimal,
    pub amount_paid: Decimal,
    #[serde(default)]
    pub balance_due: Decimal,
    #[serde(default)]
    pub advanced_paid: Decimal,
    #[serde(default)]
    pub paid_dates: Vec<NaiveDate>,
    pub remarks: Option<String>,
}

impl SalaryFields {
    /// Latest paid date, or the payment date when no dates are listed.
    pub fn paid_to_date(&self) -> NaiveDate {
        self.paid_dates.iter().max().copied().unwrap_or(self.date)
    }

    pub fn total_paid_days(&self) -> i32 {
        self.total_paid_days
            .unwrap_or_else(|| i32::try_from(self.paid_dates.len()).unwrap_or(i32::MAX))
    }
}

#[async_trait]
impl LedgerLinked for Salary {
    type Fields = SalaryFields;

    const TABLE: &'static str = "salaries";
    const LABEL: &'static str = "Salary information";

    fn ledger_tag(_fields: &SalaryFields) -> LedgerTag {
        LedgerTag::new(LedgerSource::EmployeePayment, LedgerCategory::Spending)
    }

    fn record_date(fields: &SalaryFields) -> NaiveDate {
        fields.date
    }

    /// The ledger always carries what was actually paid out.
    fn ledger_amount(fields: &SalaryFields, _input: &LedgerInput) -> Option<Decimal> {
        Some(fields.amount_paid)
    }

    fn ledger_employee(fields: &SalaryFields) -> Option<Uuid> {
        Some(fields.employee)
    }

    fn validate(fields: &SalaryFields) -> Result<(), AppError> {
        let amounts = [
            fields.total_payable,
            fields.amount_paid,
            fields.balance_due,
            fields.advanced_paid,
        ];
        if amounts.iter().any(|amount| *amount < Decimal::ZERO) {
            return Err(AppError::Validation(
                "salary amounts must not be negative".to_string(),
            ));
        }
        if !fields.balance_due.is_zero() && !fields.advanced_paid.is_zero() {
            return Err(AppError::Validation(
                "balanceDue and advancedPaid cannot both be non-zero".to_string(),
            ));
        }
        if fields.total_paid_days.is_some_and(|days| days < 0) {
            return Err(AppError::Validation(
                "totalPaidDays must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }

    async fn insert(
        conn: &mut PgConnection,
        id: Uuid,
        ctx: &RequestContext,
        transaction_id: Uuid,
        fields: &SalaryFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Salary>(
            r#"
            INSERT INTO salaries (
                id, employee_id, transaction_id, date, total_paid_days, total_payable,
                amount_paid, balance_due, advanced_paid, paid_dates, paid_to_date, remarks,
                business_id, created_by, updated_by
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14
            )
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.employee)
        .bind(transaction_id)
        .bind(fields.date)
        .bind(fields.total_paid_days())
        .bind(fields.total_payable)
        .bind(fields.amount_paid)
        .bind(fields.balance_due)
        .bind(fields.advanced_paid)
        .bind(&fields.paid_dates)
        .bind(fields.paid_to_date())
        .bind(&fields.remarks)
        .bind(ctx.business_id)
        .bind(ctx.user_id)
        .fetch_one(conn)
        .await
    }

    async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        ctx: &RequestContext,
        fields: &SalaryFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Salary>(
            r#"
            UPDATE salaries
            SET
                employee_id = $3,
                date = $4,
                total_paid_days = $5,
                total_payable = $6,
                amount_paid = $7,
                balance_due = $8,
                advanced_paid = $9,
                paid_dates = $10,
                paid_to_date = $11,
                remarks = $12,
                updated_by = $13,
                updated_at = NOW()
            WHERE id = $1 AND business_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ctx.business_id)
        .bind(fields.employee)
        .bind(fields.date)
        .bind(fields.total_paid_days())
        .bind(fields.total_payable)
        .bind(fields.amount_paid)
        .bind(fields.balance_due)
        .bind(fields.advanced_paid)
        .bind(&fields.paid_dates)
        .bind(fields.paid_to_date())
        .bind(&fields.remarks)
        .bind(ctx.user_id)
        .fetch_one(conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> SalaryFields {
        serde_json::from_value(json!({
            "employee": "6f0c1b9e-8f5a-4f57-9c1e-2d7a7c0b1a11",
            "date": "2024-04-05",
            "totalPayable": 1500,
            "amountPaid": 1000,
            "balanceDue": 500,
            "paidDates": ["2024-04-01", "2024-04-03", "2024-04-02"]
        }))
        .expect("payload should parse")
    }

    #[test]
    fn test_paid_to_date_is_latest_paid_date() {
        assert_eq!(
            fields().paid_to_date(),
            NaiveDate::from_ymd_opt(2024, 4, 3).unwrap()
        );
    }

    #[test]
    fn test_paid_to_date_falls_back_to_payment_date() {
        let mut f = fields();
        f.paid_dates.clear();
        assert_eq!(f.paid_to_date(), f.date);
    }

    #[test]
    fn test_total_paid_days_defaults_to_date_count() {
        let mut f = fields();
        assert_eq!(f.total_paid_days(), 3);
        f.total_paid_days = Some(5);
        assert_eq!(f.total_paid_days(), 5);
    }

    #[test]
    fn test_ledger_amount_is_amount_paid() {
        let f = fields();
        let input = LedgerInput {
            amount: Some(Decimal::new(99, 0)),
            ..Default::default()
        };
        assert_eq!(Salary::ledger_amount(&f, &input), Some(Decimal::new(1000, 0)));
        assert_eq!(Salary::ledger_employee(&f), Some(f.employee));
    }

    #[test]
    fn test_balance_and_advance_are_exclusive() {
        let mut f = fields();
        assert!(Salary::validate(&f).is_ok());

        f.advanced_paid = Decimal::new(100, 0);
        assert!(matches!(Salary::validate(&f), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut f = fields();
        f.amount_paid = Decimal::new(-1, 0);
        assert!(matches!(Salary::validate(&f), Err(AppError::Validation(_))));
    }
}
