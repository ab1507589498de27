use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A billable unit of labor. Linked to an invoice once billed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub id: Uuid,
    #[serde(rename = "business")]
    pub business_id: Uuid,
    #[serde(rename = "service")]
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(rename = "customer")]
    pub customer_id: Uuid,
    pub site: Option<String>,
    pub workers: Vec<Uuid>,
    pub rate: Decimal,
    pub quantity: Decimal,
    pub total: Decimal,
    #[serde(rename = "vehicle")]
    pub vehicle_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub invoice_number: Option<i64>,
    pub description: Option<String>,
    #[serde(rename = "active")]
    pub is_active: bool,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
