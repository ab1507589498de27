//! Attendance tracking and salary accrual.

pub mod attendance;
pub mod calculator;
pub mod handlers;
pub mod salary;


pub use attendance::{delete_attendance, list_attendance, mark_attendance};
pub use calculator::{compute_salary, expand_dates, SalaryCalculation};
pub use salary::calculate_salary;
