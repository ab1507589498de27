use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Defined,
    Shared,
    Processed,
    Approved,
    Denied,
    Hold,
    Overdue,
}

/// One entry of an invoice's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: InvoiceStatus,
    pub changed_by: Uuid,
    pub changed_at: DateTime<Utc>,
}

/// Invoice billing a set of works to a customer.
///
/// This struct maps to the `invoices` table. The invoice number comes from
/// the invoice counter at creation time and is never reassigned.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Unique identifier for the invoice
    pub id: Uuid,

    /// Sequence number issued by the invoice counter
    pub invoice_number: i64,

    /// Ids of the billed works
    pub works: Vec<Uuid>,

    /// Customer being billed
    pub invoice_to: Uuid,

    pub invoice_to_name: String,

    pub invoice_from_name: String,

    #[serde(rename = "business")]
    pub business_id: Uuid,

    /// Invoice date
    pub date: NaiveDate,

    pub invoice_brief: Option<String>,

    /// Sum of the billed works' totals
    pub subtotal: Decimal,

    /// Flat amount taken off the subtotal
    pub discount: Decimal,

    pub gst_percent: Decimal,

    pub gst_amount: Decimal,

    pub tds_percent: Decimal,

    pub tds_amount: Decimal,

    /// Amount expected from the customer
    pub invoiced_amount: Decimal,

    pub description: Option<String>,

    pub status: InvoiceStatus,

    pub expected_clearance_date: Option<NaiveDate>,

    pub status_history: Json<Vec<StatusChange>>,

    /// Linked ledger entry; set within the creating transaction
    #[serde(rename = "transaction")]
    pub transaction_id: Option<Uuid>,

    #[serde(rename = "active")]
    pub is_active: bool,

    pub created_by: Uuid,

    pub updated_by: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Invoice creation request. The invoice number is server-assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoice {
    pub works: Vec<Uuid>,
    pub invoice_to: Uuid,
    pub invoice_to_name: String,
    pub invoice_from_name: String,
    pub date: Option<NaiveDate>,
    pub invoice_brief: Option<String>,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub gst_percent: Decimal,
    #[serde(default)]
    pub tds_percent: Decimal,
    pub description: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub expected_clearance_date: Option<NaiveDate>,
}

/// Invoice update request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoice {
    pub status: Option<InvoiceStatus>,
    pub description: Option<String>,
    pub invoice_brief: Option<String>,
    pub expected_clearance_date: Option<NaiveDate>,
    pub discount: Option<Decimal>,
    pub gst_percent: Option<Decimal>,
    pub tds_percent: Option<Decimal>,
}
