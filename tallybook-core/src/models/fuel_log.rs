use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::AppError;
use crate::ledger::LedgerLinked;
use crate::models::ledger_entry::{LedgerCategory, LedgerSource, LedgerTag};

/// Fuel purchased at a petrol pump, optionally for a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FuelLog {
    pub id: Uuid,
    pub date: NaiveDate,
    pub fuel: String,
    #[serde(rename = "petrolPump")]
    pub petrol_pump_id: Uuid,
    pub rate: Decimal,
    pub volume: Decimal,
    pub total: Decimal,
    #[serde(rename = "vehicle")]
    pub vehicle_id: Option<Uuid>,
    #[serde(rename = "employee")]
    pub employee_id: Option<Uuid>,
    /// Pump bill number
    #[serde(rename = "invoiceId")]
    pub invoice_ref: Option<String>,
    #[serde(rename = "transaction")]
    pub transaction_id: Uuid,
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
pub struct FuelLogFields {
    pub date: NaiveDate,
    pub fuel: String,
    pub petrol_pump: Uuid,
    pub rate: Decimal,
    pub volume: Decimal,
    pub total: Decimal,
    pub vehicle: Option<Uuid>,
    pub employee: Option<Uuid>,
    pub invoice_id: Option<String>,
}

#[async_trait]
impl LedgerLinked for FuelLog {
    type Fields = FuelLogFields;

    const TABLE: &'static str = "fuel_logs";
    const LABEL: &'static str = "Fuel information";

    fn ledger_tag(_fields: &FuelLogFields) -> LedgerTag {
        LedgerTag::new(LedgerSource::FuelLog, LedgerCategory::Spending)
    }

    fn record_date(fields: &FuelLogFields) -> NaiveDate {
        fields.date
    }

    fn ledger_employee(fields: &FuelLogFields) -> Option<Uuid> {
        fields.employee
    }

    fn validate(fields: &FuelLogFields) -> Result<(), AppError> {
        if fields.rate < Decimal::ZERO || fields.volume < Decimal::ZERO || fields.total < Decimal::ZERO {
            return Err(AppError::Validation(
                "rate, volume and total must not be negative".to_string(),
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
        fields: &FuelLogFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, FuelLog>(
            r#"
            INSERT INTO fuel_logs (
                id, date, fuel, petrol_pump_id, rate, volume, total, vehicle_id,
                employee_id, invoice_ref, transaction_id, business_id, created_by, updated_by
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13
            )
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.date)
        .bind(&fields.fuel)
        .bind(fields.petrol_pump)
        .bind(fields.rate)
        .bind(fields.volume)
        .bind(fields.total)
        .bind(fields.vehicle)
        .bind(fields.employee)
        .bind(&fields.invoice_id)
        .bind(transaction_id)
        .bind(ctx.business_id)
        .bind(ctx.user_id)
        .fetch_one(conn)
        .await
    }

    async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        ctx: &RequestContext,
        fields: &FuelLogFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, FuelLog>(
            r#"
            UPDATE fuel_logs
            SET
                date = $3,
                fuel = $4,
                petrol_pump_id = $5,
                rate = $6,
                volume = $7,
                total = $8,
                vehicle_id = $9,
                employee_id = $10,
                invoice_ref = $11,
                updated_by = $12,
                updated_at = NOW()
            WHERE id = $1 AND business_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ctx.business_id)
        .bind(fields.date)
        .bind(&fields.fuel)
        .bind(fields.petrol_pump)
        .bind(fields.rate)
        .bind(fields.volume)
        .bind(fields.total)
        .bind(fields.vehicle)
        .bind(fields.employee)
        .bind(&fields.invoice_id)
        .bind(ctx.user_id)
        .fetch_one(conn)
        .await
    }
}
