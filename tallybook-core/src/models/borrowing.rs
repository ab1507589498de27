use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::AppError;
use crate::ledger::LedgerLinked;
use crate::models::ledger_entry::{LedgerCategory, LedgerSource, LedgerTag};

/// Direction of a borrowing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowingType {
    /// Money the business borrowed
    Borrowed,
    /// Money the business lent out
    Lent,
}

/// Money borrowed from or lent to a contact.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Borrowing {
    pub id: Uuid,
    pub date: NaiveDate,
    pub scheduled_return_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub borrowing_type: BorrowingType,
    pub purpose: String,
    pub description: Option<String>,
    #[serde(rename = "person")]
    pub person_id: Option<Uuid>,
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
pub struct BorrowingFields {
    pub date: NaiveDate,
    pub scheduled_return_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub borrowing_type: BorrowingType,
    pub purpose: String,
    pub description: Option<String>,
    pub person: Option<Uuid>,
}

#[async_trait]
impl LedgerLinked for Borrowing {
    type Fields = BorrowingFields;

    const TABLE: &'static str = "borrowings";
    const LABEL: &'static str = "Borrowing information";

    fn ledger_tag(fields: &BorrowingFields) -> LedgerTag {
        match fields.borrowing_type {
            BorrowingType::Borrowed => LedgerTag::new(LedgerSource::Borrowed, LedgerCategory::Borrowing),
            BorrowingType::Lent => LedgerTag::new(LedgerSource::Lend, LedgerCategory::Lending),
        }
    }

    fn record_date(fields: &BorrowingFields) -> NaiveDate {
        fields.date
    }

    fn validate(fields: &BorrowingFields) -> Result<(), AppError> {
        if fields.purpose.trim().is_empty() {
            return Err(AppError::Validation("purpose is required".to_string()));
        }
        if let Some(return_date) = fields.scheduled_return_date {
            if return_date < fields.date {
                return Err(AppError::Validation(
                    "scheduledReturnDate must not precede date".to_string(),
                ));
            }
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
        fields: &BorrowingFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (
                id, date, scheduled_return_date, borrowing_type, purpose, description,
                person_id, transaction_id, business_id, created_by, updated_by
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10
            )
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.date)
        .bind(fields.scheduled_return_date)
        .bind(fields.borrowing_type)
        .bind(&fields.purpose)
        .bind(&fields.description)
        .bind(fields.person)
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
        fields: &BorrowingFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Borrowing>(
            r#"
            UPDATE borrowings
            SET
                date = $3,
                scheduled_return_date = $4,
                purpose = $5,
                description = $6,
                person_id = $7,
                updated_by = $8,
                updated_at = NOW()
            WHERE id = $1 AND business_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ctx.business_id)
        .bind(fields.date)
        .bind(fields.scheduled_return_date)
        .bind(&fields.purpose)
        .bind(&fields.description)
        .bind(fields.person)
        .bind(ctx.user_id)
        .fetch_one(conn)
        .await
    }
}
