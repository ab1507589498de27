use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::AppError;
use crate::ledger::LedgerLinked;
use crate::models::ledger_entry::{LedgerCategory, LedgerSource, LedgerTag};

/// General business spending.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Expenditure {
    pub id: Uuid,
    pub date: NaiveDate,
    pub place: Option<String>,
    pub purpose: String,
    pub description: Option<String>,
    #[serde(rename = "employee")]
    pub employee_id: Option<Uuid>,
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
pub struct ExpenditureFields {
    pub date: NaiveDate,
    pub place: Option<String>,
    pub purpose: String,
    pub description: Option<String>,
    pub employee: Option<Uuid>,
}

#[async_trait]
impl LedgerLinked for Expenditure {
    type Fields = ExpenditureFields;

    const TABLE: &'static str = "expenditures";
    const LABEL: &'static str = "Expenditure information";

    fn ledger_tag(_fields: &ExpenditureFields) -> LedgerTag {
        LedgerTag::new(LedgerSource::Expenditure, LedgerCategory::Spending)
    }

    fn record_date(fields: &ExpenditureFields) -> NaiveDate {
        fields.date
    }

    fn ledger_employee(fields: &ExpenditureFields) -> Option<Uuid> {
        fields.employee
    }

    fn validate(fields: &ExpenditureFields) -> Result<(), AppError> {
        if fields.purpose.trim().is_empty() {
            return Err(AppError::Validation("purpose is required".to_string()));
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
        fields: &ExpenditureFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Expenditure>(
            r#"
            INSERT INTO expenditures (
                id, date, place, purpose, description, employee_id,
                transaction_id, business_id, created_by, updated_by
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $9
            )
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.date)
        .bind(&fields.place)
        .bind(&fields.purpose)
        .bind(&fields.description)
        .bind(fields.employee)
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
        fields: &ExpenditureFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Expenditure>(
            r#"
            UPDATE expenditures
            SET
                date = $3,
                place = $4,
                purpose = $5,
                description = $6,
                employee_id = $7,
                updated_by = $8,
                updated_at = NOW()
            WHERE id = $1 AND business_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ctx.business_id)
        .bind(fields.date)
        .bind(&fields.place)
        .bind(&fields.purpose)
        .bind(&fields.description)
        .bind(fields.employee)
        .bind(ctx.user_id)
        .fetch_one(conn)
        .await
    }
}
