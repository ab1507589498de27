//! Shared fixtures for database-backed tests.
//!
//! Every helper writes rows under a fresh business id so tests never see each
//! other's data.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::RequestContext;

/// Connects to `DATABASE_URL` and applies the embedded migrations.
pub async fn create_test_pool() -> Result<PgPool, anyhow::Error> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL not set for tests"))?;
    let pool = PgPool::connect(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

pub fn test_context() -> RequestContext {
    RequestContext {
        user_id: Uuid::new_v4(),
        business_id: Uuid::new_v4(),
    }
}

pub async fn insert_employee(
    pool: &PgPool,
    ctx: &RequestContext,
    wage_per_day: Option<Decimal>,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO employees (id, business_id, name, wage_per_day) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(ctx.business_id)
        .bind("Ravi")
        .bind(wage_per_day)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn insert_work(
    pool: &PgPool,
    ctx: &RequestContext,
    total: Decimal,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO works (
            id, business_id, service_id, date, customer_id, rate, quantity, total,
            created_by, updated_by
        ) VALUES ($1, $2, $3, CURRENT_DATE, $4, $5, 1, $5, $6, $6)
        "#,
    )
    .bind(id)
    .bind(ctx.business_id)
    .bind(Uuid::new_v4())
    .bind(Uuid::new_v4())
    .bind(total)
    .bind(ctx.user_id)
    .execute(pool)
    .await?;
    Ok(id)
}
