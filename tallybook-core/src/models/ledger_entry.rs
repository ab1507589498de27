use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Domain event that produced a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerSource {
    Invoice,
    EmployeePayment,
    FuelLog,
    FarmIncome,
    OtherIncome,
    Maintenance,
    Expenditure,
    Borrowed,
    Lend,
}

impl LedgerSource {
    /// Table holding the records that own entries of this source.
    ///
    /// `Maintenance` has no owning table yet; entries of that source are
    /// never produced by the co-creation flows.
    pub fn owner_table(self) -> Option<&'static str> {
        match self {
            LedgerSource::Invoice => Some("invoices"),
            LedgerSource::EmployeePayment => Some("salaries"),
            LedgerSource::FuelLog => Some("fuel_logs"),
            LedgerSource::FarmIncome | LedgerSource::OtherIncome => Some("revenues"),
            LedgerSource::Expenditure => Some("expenditures"),
            LedgerSource::Borrowed | LedgerSource::Lend => Some("borrowings"),
            LedgerSource::Maintenance => None,
        }
    }
}

/// Direction of the money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerCategory {
    Income,
    Spending,
    Borrowing,
    Lending,
}

/// How the money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    #[default]
    Cash,
    Online,
    BankTransfer,
    Upi,
    Card,
    Paytm,
    Cheque,
    Rtgs,
    Neft,
    Dd,
    OtherEwallet,
}

/// Settlement state of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerStatus {
    #[default]
    Paid,
    Pdc,
    Failed,
    InProgress,
    Awaiting,
    Canceled,
    PartiallyPaid,
    Scheduled,
    Unpaid,
}

/// Fixed (source, category) pair stamped on an entry by its owning record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTag {
    pub source: LedgerSource,
    pub category: LedgerCategory,
}

impl LedgerTag {
    pub const fn new(source: LedgerSource, category: LedgerCategory) -> Self {
        Self { source, category }
    }
}

/// One money movement, linked 1:1 to the domain record that caused it.
///
/// Maps to the `ledger_entries` table. `source`, `category` and `source_id`
/// are written once at creation and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: Uuid,
    pub source: LedgerSource,
    pub category: LedgerCategory,
    /// Id of the owning domain record
    pub source_id: Uuid,
    pub mode: PaymentMode,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub status: LedgerStatus,
    #[serde(rename = "employee")]
    pub employee_id: Option<Uuid>,
    #[serde(rename = "active")]
    pub is_active: bool,
    #[serde(rename = "business")]
    pub business_id: Uuid,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn tag(&self) -> LedgerTag {
        LedgerTag::new(self.source, self.category)
    }
}

/// Ledger entry about to be inserted.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub id: Uuid,
    pub tag: LedgerTag,
    pub source_id: Uuid,
    pub mode: PaymentMode,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub status: LedgerStatus,
    pub employee_id: Option<Uuid>,
    pub business_id: Uuid,
    pub created_by: Uuid,
}

/// Nested `transaction` object carried by create and update payloads.
///
/// Any client-supplied `_id` is ignored; entry ids are always server-generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerInput {
    pub amount: Option<Decimal>,
    pub mode: Option<PaymentMode>,
    pub date: Option<NaiveDate>,
    pub status: Option<LedgerStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enums_use_upper_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_value(LedgerSource::EmployeePayment).unwrap(),
            json!("EMPLOYEE_PAYMENT")
        );
        assert_eq!(
            serde_json::to_value(LedgerStatus::PartiallyPaid).unwrap(),
            json!("PARTIALLY_PAID")
        );
        assert_eq!(
            serde_json::from_value::<PaymentMode>(json!("OTHER_EWALLET")).unwrap(),
            PaymentMode::OtherEwallet
        );
    }

    #[test]
    fn test_ledger_input_ignores_client_id() {
        let input: LedgerInput = serde_json::from_value(json!({
            "_id": "5f1b2c3d4e5f6a7b8c9d0e1f",
            "amount": 250.5,
            "mode": "UPI"
        }))
        .expect("payload should parse");

        assert_eq!(input.amount, Some(Decimal::new(2505, 1)));
        assert_eq!(input.mode, Some(PaymentMode::Upi));
        assert_eq!(input.status, None);
    }

    #[test]
    fn test_every_produced_source_has_owner_table() {
        for source in [
            LedgerSource::Invoice,
            LedgerSource::EmployeePayment,
            LedgerSource::FuelLog,
            LedgerSource::FarmIncome,
            LedgerSource::OtherIncome,
            LedgerSource::Expenditure,
            LedgerSource::Borrowed,
            LedgerSource::Lend,
        ] {
            assert!(source.owner_table().is_some(), "{:?}", source);
        }
        assert_eq!(LedgerSource::Maintenance.owner_table(), None);
    }
}
