use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::AppError;
use crate::models::{Attendance, MarkAttendance};

/// Optional date window for listing attendance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Conflict message shown when a span is already marked.
fn overlap_message(start: NaiveDate, end: NaiveDate) -> String {
    const FORMAT: &str = "%a %b %d %Y";
    if start == end {
        format!("The attendance have been already marked for {}", start.format(FORMAT))
    } else {
        format!(
            "The attendance have been already marked for employee from {} to the {}",
            start.format(FORMAT),
            end.format(FORMAT)
        )
    }
}

async fn ensure_employee(pool: &PgPool, ctx: &RequestContext, employee_id: Uuid) -> Result<(), AppError> {
    let exists: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM employees WHERE id = $1 AND business_id = $2 AND is_active = TRUE",
    )
    .bind(employee_id)
    .bind(ctx.business_id)
    .fetch_optional(pool)
    .await?;

    match exists {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(format!("unknown employee {}", employee_id))),
    }
}

/// Marks a span of attendance for an employee.
///
/// Spans of the same employee may not intersect. The pre-check produces the
/// user-facing message; the `attendance_no_overlap` exclusion constraint
/// catches the concurrent case and surfaces as a conflict as well.
pub async fn mark_attendance(
    pool: &PgPool,
    ctx: &RequestContext,
    payload: MarkAttendance,
) -> Result<Attendance, AppError> {
    if payload.start_date > payload.end_date {
        return Err(AppError::Validation(
            "startDate must not be after endDate".to_string(),
        ));
    }
    ensure_employee(pool, ctx, payload.employee).await?;

    let existing: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM attendance
        WHERE business_id = $1
            AND employee_id = $2
            AND is_active = TRUE
            AND start_date <= $4
            AND end_date >= $3
        LIMIT 1
        "#,
    )
    .bind(ctx.business_id)
    .bind(payload.employee)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .fetch_optional(pool)
    .await?;

    if let Some((existing_id,)) = existing {
        warn!(
            employee_id = %payload.employee,
            existing_id = %existing_id,
            "Attendance overlaps an existing span"
        );
        return Err(AppError::Conflict(overlap_message(
            payload.start_date,
            payload.end_date,
        )));
    }

    let attendance = sqlx::query_as::<_, Attendance>(
        r#"
        INSERT INTO attendance (
            id, employee_id, business_id, start_date, end_date, start_time, end_time,
            all_day, location, notes, created_by, updated_by
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11
        )
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.employee)
    .bind(ctx.business_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(&payload.start_time)
    .bind(&payload.end_time)
    .bind(payload.all_day)
    .bind(&payload.location)
    .bind(&payload.notes)
    .bind(ctx.user_id)
    .fetch_one(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => {
            AppError::Conflict(overlap_message(payload.start_date, payload.end_date))
        }
        other => other,
    })?;

    info!(
        attendance_id = %attendance.id,
        employee_id = %attendance.employee_id,
        start = %attendance.start_date,
        end = %attendance.end_date,
        "Marked attendance"
    );
    Ok(attendance)
}

/// Soft-deletes an attendance span, freeing its days for re-marking.
pub async fn delete_attendance(
    pool: &PgPool,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<Attendance, AppError> {
    sqlx::query_as::<_, Attendance>(
        r#"
        UPDATE attendance
        SET is_active = FALSE, updated_by = $3, updated_at = NOW()
        WHERE id = $1 AND business_id = $2 AND is_active = TRUE
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(ctx.business_id)
    .bind(ctx.user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("attendance {}", id)))
}

/// Active spans of an employee intersecting the optional window.
pub async fn list_attendance(
    pool: &PgPool,
    ctx: &RequestContext,
    employee_id: Uuid,
    range: &AttendanceRange,
) -> Result<Vec<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(
        r#"
        SELECT * FROM attendance
        WHERE business_id = $1
            AND employee_id = $2
            AND is_active = TRUE
            AND ($3::date IS NULL OR end_date >= $3)
            AND ($4::date IS NULL OR start_date <= $4)
        ORDER BY start_date
        "#,
    )
    .bind(ctx.business_id)
    .bind(employee_id)
    .bind(range.from)
    .bind(range.to)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_day_message() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(
            overlap_message(d, d),
            "The attendance have been already marked for Mon Jun 03 2024"
        );
    }

    #[test]
    fn test_range_message() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert_eq!(
            overlap_message(start, end),
            "The attendance have been already marked for employee from Mon Jun 03 2024 to the Wed Jun 05 2024"
        );
    }
}
