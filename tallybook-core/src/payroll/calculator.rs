//! Salary accrual from attendance.
//!
//! Everything here is pure; [`crate::payroll::calculate_salary`] fetches the
//! inputs and hands them to [`compute_salary`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Attendance, Salary};

/// Computed-but-unpersisted salary figures for one employee.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryCalculation {
    pub employee: Uuid,
    pub date: NaiveDate,
    pub total_payable: Decimal,
    pub balance_due: Decimal,
    pub advanced_paid: Decimal,
    /// One entry per attended day; overlapping spans repeat a day
    pub unpaid_dates: Vec<NaiveDate>,
    pub attendance: Vec<Attendance>,
    pub previous_payment: Option<Salary>,
}

/// Every calendar day in each span, inclusive, in input order.
pub fn expand_dates(attendance: &[Attendance]) -> Vec<NaiveDate> {
    attendance
        .iter()
        .flat_map(|span| {
            span.start_date
                .iter_days()
                .take_while(move |day| *day <= span.end_date)
        })
        .collect()
}

/// Splits a carried-forward difference into `(balance_due, advanced_paid)`.
///
/// A positive difference is still owed to the employee; a negative one was
/// paid in advance. At most one side is non-zero.
pub fn carry_forward(diff: Decimal) -> (Decimal, Decimal) {
    if diff >= Decimal::ZERO {
        (diff, Decimal::ZERO)
    } else {
        (Decimal::ZERO, -diff)
    }
}

/// Derives payable wages from unpaid attendance and the previous payment.
///
/// `attendance` must already be limited to the unpaid period. Days listed in
/// the previous payment's `paid_dates` are never counted again, and spans
/// made up only of such days are left out. Without a previous payment
/// nothing is carried forward.
pub fn compute_salary(
    wage_per_day: Decimal,
    attendance: &[Attendance],
    previous: Option<Salary>,
    employee_id: Uuid,
    today: NaiveDate,
) -> SalaryCalculation {
    let paid: &[NaiveDate] = previous
        .as_ref()
        .map(|payment| payment.paid_dates.as_slice())
        .unwrap_or_default();

    let attendance: Vec<Attendance> = attendance
        .iter()
        .filter(|span| {
            span.start_date
                .iter_days()
                .take_while(|day| *day <= span.end_date)
                .any(|day| !paid.contains(&day))
        })
        .cloned()
        .collect();
    let unpaid_dates: Vec<NaiveDate> = expand_dates(&attendance)
        .into_iter()
        .filter(|d| !paid.contains(d))
        .collect();
    let total_payable = wage_per_day * Decimal::from(unpaid_dates.len());

    let (balance_due, advanced_paid) = match &previous {
        Some(payment) => {
            carry_forward(total_payable + payment.balance_due - payment.advanced_paid)
        }
        None => (Decimal::ZERO, Decimal::ZERO),
    };

    SalaryCalculation {
        employee: employee_id,
        date: today,
        total_payable,
        balance_due,
        advanced_paid,
        unpaid_dates,
        attendance,
        previous_payment: previous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn span(employee: Uuid, start: u32, end: u32) -> Attendance {
        Attendance {
            id: Uuid::new_v4(),
            employee_id: employee,
            business_id: Uuid::nil(),
            start_date: day(start),
            end_date: day(end),
            start_time: None,
            end_time: None,
            all_day: true,
            location: None,
            notes: None,
            is_active: true,
            created_by: Uuid::nil(),
            updated_by: Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn payment(employee: Uuid, balance_due: i64, advanced_paid: i64) -> Salary {
        Salary {
            id: Uuid::new_v4(),
            employee_id: employee,
            transaction_id: Uuid::new_v4(),
            date: day(1),
            total_paid_days: 0,
            total_payable: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
            balance_due: Decimal::from(balance_due),
            advanced_paid: Decimal::from(advanced_paid),
            paid_dates: Vec::new(),
            paid_to_date: day(1),
            remarks: None,
            business_id: Uuid::nil(),
            is_active: true,
            created_by: Uuid::nil(),
            updated_by: Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_expand_dates_is_inclusive() {
        let employee = Uuid::new_v4();
        let dates = expand_dates(&[span(employee, 1, 3), span(employee, 5, 5)]);
        assert_eq!(dates, vec![day(1), day(2), day(3), day(5)]);
    }

    #[test]
    fn test_expand_dates_keeps_overlapping_days() {
        let employee = Uuid::new_v4();
        let dates = expand_dates(&[span(employee, 1, 2), span(employee, 2, 3)]);
        assert_eq!(dates.len(), 4);
    }

    #[test]
    fn test_no_previous_payment() {
        let employee = Uuid::new_v4();
        let result = compute_salary(
            Decimal::from(500),
            &[span(employee, 1, 3)],
            None,
            employee,
            day(10),
        );
        assert_eq!(result.unpaid_dates.len(), 3);
        assert_eq!(result.total_payable, Decimal::from(1500));
        assert_eq!(result.balance_due, Decimal::ZERO);
        assert_eq!(result.advanced_paid, Decimal::ZERO);
    }

    #[test]
    fn test_previous_balance_is_added() {
        let employee = Uuid::new_v4();
        let result = compute_salary(
            Decimal::from(500),
            &[span(employee, 2, 3)],
            Some(payment(employee, 200, 0)),
            employee,
            day(10),
        );
        assert_eq!(result.total_payable, Decimal::from(1000));
        assert_eq!(result.balance_due, Decimal::from(1200));
        assert_eq!(result.advanced_paid, Decimal::ZERO);
    }

    #[test]
    fn test_previous_advance_exceeds_new_wages() {
        let employee = Uuid::new_v4();
        let result = compute_salary(
            Decimal::from(500),
            &[span(employee, 2, 3)],
            Some(payment(employee, 0, 1500)),
            employee,
            day(10),
        );
        assert_eq!(result.total_payable, Decimal::from(1000));
        assert_eq!(result.balance_due, Decimal::ZERO);
        assert_eq!(result.advanced_paid, Decimal::from(500));
    }

    #[test]
    fn test_previously_paid_days_are_not_counted_again() {
        let employee = Uuid::new_v4();
        let mut previous = payment(employee, 0, 0);
        previous.paid_dates = vec![day(1), day(2), day(3)];
        previous.paid_to_date = day(3);

        let settled = compute_salary(
            Decimal::from(500),
            &[span(employee, 3, 3)],
            Some(previous.clone()),
            employee,
            day(10),
        );
        assert!(settled.unpaid_dates.is_empty());
        assert!(settled.attendance.is_empty());
        assert_eq!(settled.total_payable, Decimal::ZERO);
        assert_eq!(settled.balance_due, Decimal::ZERO);

        let partial = compute_salary(
            Decimal::from(500),
            &[span(employee, 3, 5)],
            Some(previous),
            employee,
            day(10),
        );
        assert_eq!(partial.unpaid_dates, vec![day(4), day(5)]);
        assert_eq!(partial.attendance.len(), 1);
        assert_eq!(partial.total_payable, Decimal::from(1000));
    }

    #[test]
    fn test_same_inputs_same_figures() {
        let employee = Uuid::new_v4();
        let attendance = vec![span(employee, 1, 4)];
        let previous = payment(employee, 0, 300);

        let first = compute_salary(Decimal::from(450), &attendance, Some(previous.clone()), employee, day(10));
        let second = compute_salary(Decimal::from(450), &attendance, Some(previous), employee, day(10));

        assert_eq!(first.total_payable, second.total_payable);
        assert_eq!(first.balance_due, second.balance_due);
        assert_eq!(first.advanced_paid, second.advanced_paid);
    }

    #[test]
    fn test_balance_and_advance_never_both_set() {
        for diff in [-250, -1, 0, 1, 999] {
            let (balance_due, advanced_paid) = carry_forward(Decimal::from(diff));
            assert!(balance_due.is_zero() || advanced_paid.is_zero());
            assert!(balance_due >= Decimal::ZERO && advanced_paid >= Decimal::ZERO);
        }
    }
}
