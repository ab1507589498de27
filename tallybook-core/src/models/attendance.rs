use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One continuous span of work days for an employee.
///
/// Maps to the `attendance` table. The date range is inclusive on both ends
/// and immutable once marked.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    #[serde(rename = "employee")]
    pub employee_id: Uuid,
    #[serde(rename = "business")]
    pub business_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Wall-clock time, e.g. "09:00"
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub all_day: bool,
    pub location: Option<String>,
    pub notes: Option<String>,
    #[serde(rename = "active")]
    pub is_active: bool,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attendance marking request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
    pub employee: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    pub location: Option<String>,
    pub notes: Option<String>,
}
