use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::AppError;
use crate::models::{Attendance, Employee, Salary};
use crate::payroll::calculator::{compute_salary, SalaryCalculation};

/// Most recent active payment: greatest `paid_to_date`, latest created first on ties.
pub async fn latest_payment(
    pool: &PgPool,
    business_id: Uuid,
    employee_id: Uuid,
) -> Result<Option<Salary>, sqlx::Error> {
    sqlx::query_as::<_, Salary>(
        r#"
        SELECT * FROM salaries
        WHERE business_id = $1 AND employee_id = $2 AND is_active = TRUE
        ORDER BY paid_to_date DESC, created_at DESC
        LIMIT 1
        "#,
    )
    .bind(business_id)
    .bind(employee_id)
    .fetch_optional(pool)
    .await
}

/// Attendance ended by `today` and, when given, starting on or after `paid_to`.
pub async fn unpaid_attendance(
    pool: &PgPool,
    business_id: Uuid,
    employee_id: Uuid,
    paid_to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<Vec<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(
        r#"
        SELECT * FROM attendance
        WHERE business_id = $1
            AND employee_id = $2
            AND is_active = TRUE
            AND end_date <= $3
            AND ($4::date IS NULL OR start_date >= $4)
        ORDER BY start_date
        "#,
    )
    .bind(business_id)
    .bind(employee_id)
    .bind(today)
    .bind(paid_to)
    .fetch_all(pool)
    .await
}

/// Calculates what an employee is owed as of `today`. Nothing is written.
///
/// # Errors
///
/// Returns `NotFound` if the employee does not exist in the caller's business.
pub async fn calculate_salary(
    pool: &PgPool,
    ctx: &RequestContext,
    employee_id: Uuid,
    today: NaiveDate,
) -> Result<SalaryCalculation, AppError> {
    let employee = sqlx::query_as::<_, Employee>(
        "SELECT * FROM employees WHERE id = $1 AND business_id = $2",
    )
    .bind(employee_id)
    .bind(ctx.business_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("employee {}", employee_id)))?;

    let previous = latest_payment(pool, ctx.business_id, employee_id).await?;
    let attendance = unpaid_attendance(
        pool,
        ctx.business_id,
        employee_id,
        previous.as_ref().map(|p| p.paid_to_date),
        today,
    )
    .await?;

    let calculation = compute_salary(
        employee.wage_per_day.unwrap_or(Decimal::ZERO),
        &attendance,
        previous,
        employee_id,
        today,
    );

    info!(
        employee_id = %employee_id,
        unpaid_days = calculation.unpaid_dates.len(),
        total_payable = %calculation.total_payable,
        "Calculated salary"
    );
    Ok(calculation)
}
