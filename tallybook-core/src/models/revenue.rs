use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::ledger::LedgerLinked;
use crate::models::ledger_entry::{LedgerCategory, LedgerSource, LedgerTag};

/// Where non-invoice income came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevenueSource {
    FarmIncome,
    #[default]
    OtherIncome,
}

impl From<RevenueSource> for LedgerSource {
    fn from(source: RevenueSource) -> Self {
        match source {
            RevenueSource::FarmIncome => LedgerSource::FarmIncome,
            RevenueSource::OtherIncome => LedgerSource::OtherIncome,
        }
    }
}

/// Income that is not billed through an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Revenue {
    pub id: Uuid,
    pub date: NaiveDate,
    pub source: RevenueSource,
    pub description: Option<String>,
    #[serde(rename = "customer")]
    pub customer_id: Option<Uuid>,
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
pub struct RevenueFields {
    pub date: NaiveDate,
    #[serde(default)]
    pub source: RevenueSource,
    pub description: Option<String>,
    pub customer: Option<Uuid>,
}

#[async_trait]
impl LedgerLinked for Revenue {
    type Fields = RevenueFields;

    const TABLE: &'static str = "revenues";
    const LABEL: &'static str = "Revenue information";

    fn ledger_tag(fields: &RevenueFields) -> LedgerTag {
        LedgerTag::new(fields.source.into(), LedgerCategory::Income)
    }

    fn record_date(fields: &RevenueFields) -> NaiveDate {
        fields.date
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
        fields: &RevenueFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Revenue>(
            r#"
            INSERT INTO revenues (
                id, date, source, description, customer_id,
                transaction_id, business_id, created_by, updated_by
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $8
            )
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.date)
        .bind(fields.source)
        .bind(&fields.description)
        .bind(fields.customer)
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
        fields: &RevenueFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Revenue>(
            r#"
            UPDATE revenues
            SET
                date = $3,
                description = $4,
                customer_id = $5,
                updated_by = $6,
                updated_at = NOW()
            WHERE id = $1 AND business_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ctx.business_id)
        .bind(fields.date)
        .bind(&fields.description)
        .bind(fields.customer)
        .bind(ctx.user_id)
        .fetch_one(conn)
        .await
    }
}
