use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::AppError;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Derived money fields of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceAmounts {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub gst_amount: Decimal,
    pub tds_amount: Decimal,
    pub invoiced_amount: Decimal,
}

/// Rejects a negative discount and percentages outside `0..=100`.
pub fn validate_rates(
    discount: Decimal,
    gst_percent: Decimal,
    tds_percent: Decimal,
) -> Result<(), AppError> {
    if discount < Decimal::ZERO {
        return Err(AppError::Validation("discount must not be negative".to_string()));
    }
    for (name, percent) in [("gstPercent", gst_percent), ("tdsPercent", tds_percent)] {
        if percent < Decimal::ZERO || percent > HUNDRED {
            return Err(AppError::Validation(format!(
                "{} must be between 0 and 100",
                name
            )));
        }
    }
    Ok(())
}

/// Computes invoice amounts from a subtotal.
///
/// The discount is a flat amount taken off before tax; GST is added and TDS
/// withheld on the discounted value. Every figure is rounded to 2 places.
pub fn compute(
    subtotal: Decimal,
    discount: Decimal,
    gst_percent: Decimal,
    tds_percent: Decimal,
) -> InvoiceAmounts {
    let subtotal = subtotal.round_dp(2);
    let taxable = (subtotal - discount).max(Decimal::ZERO);
    let gst_amount = (taxable * gst_percent / HUNDRED).round_dp(2);
    let tds_amount = (taxable * tds_percent / HUNDRED).round_dp(2);

    InvoiceAmounts {
        subtotal,
        discount: discount.round_dp(2),
        gst_amount,
        tds_amount,
        invoiced_amount: (taxable + gst_amount - tds_amount).round_dp(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    #[test]
    fn test_plain_subtotal() {
        let amounts = compute(d(2500, 0), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(amounts.invoiced_amount, d(2500, 0));
        assert_eq!(amounts.gst_amount, Decimal::ZERO);
    }

    #[test]
    fn test_discount_then_gst_and_tds() {
        // taxable 900, gst 18% = 162, tds 2% = 18
        let amounts = compute(d(1000, 0), d(100, 0), d(18, 0), d(2, 0));
        assert_eq!(amounts.gst_amount, d(162, 0));
        assert_eq!(amounts.tds_amount, d(18, 0));
        assert_eq!(amounts.invoiced_amount, d(1044, 0));
    }

    #[test]
    fn test_discount_larger_than_subtotal_floors_at_zero() {
        let amounts = compute(d(300, 0), d(500, 0), d(18, 0), Decimal::ZERO);
        assert_eq!(amounts.gst_amount, Decimal::ZERO);
        assert_eq!(amounts.invoiced_amount, Decimal::ZERO);
    }

    #[test]
    fn test_fractional_tax_is_rounded() {
        // 333.33 * 5% = 16.6665
        let amounts = compute(d(33333, 2), Decimal::ZERO, d(5, 0), Decimal::ZERO);
        assert_eq!(amounts.gst_amount, d(1667, 2));
        assert_eq!(amounts.invoiced_amount, d(35000, 2));
    }

    #[test]
    fn test_rate_validation() {
        assert!(validate_rates(Decimal::ZERO, d(18, 0), d(2, 0)).is_ok());
        assert!(validate_rates(d(-1, 0), Decimal::ZERO, Decimal::ZERO).is_err());
        assert!(validate_rates(Decimal::ZERO, d(101, 0), Decimal::ZERO).is_err());
        assert!(validate_rates(Decimal::ZERO, Decimal::ZERO, d(-5, 1)).is_err());
    }
}
