use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::AppError;
use crate::models::{Attendance, MarkAttendance};
use crate::payroll::attendance::{self, AttendanceRange};
use crate::payroll::calculator::SalaryCalculation;
use crate::payroll::salary;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub message: String,
    pub result: Attendance,
}

/// `POST /api/attendance`
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<MarkAttendance>,
) -> Result<(StatusCode, Json<AttendanceResponse>), AppError> {
    let result = attendance::mark_attendance(&state.db, &ctx, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AttendanceResponse {
            message: "Employee attendance added successfully".to_string(),
            result,
        }),
    ))
}

/// `DELETE /api/attendance/:id`
pub async fn delete_attendance(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<AttendanceResponse>, AppError> {
    let result = attendance::delete_attendance(&state.db, &ctx, id).await?;
    Ok(Json(AttendanceResponse {
        message: "Employee attendance deleted successfully".to_string(),
        result,
    }))
}

/// `GET /api/employees/:id/attendance`
pub async fn list_attendance(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(employee_id): Path<Uuid>,
    Query(range): Query<AttendanceRange>,
) -> Result<Json<Vec<Attendance>>, AppError> {
    let spans = attendance::list_attendance(&state.db, &ctx, employee_id, &range).await?;
    Ok(Json(spans))
}

/// Salary calculation endpoint handler.
///
/// Handles GET requests to `/api/salaries/calculate/:employeeId`. The figures
/// are computed as of today (UTC) and not persisted.
pub async fn calculate_salary(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(employee_id): Path<Uuid>,
) -> Result<Json<SalaryCalculation>, AppError> {
    let today = Utc::now().date_naive();
    let calculation = salary::calculate_salary(&state.db, &ctx, employee_id, today).await?;
    Ok(Json(calculation))
}
