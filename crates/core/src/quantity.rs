//! Quantity helpers.
//!
//! All quantities are `rust_decimal::Decimal`: scaling a recipe is exact and
//! never rounds beyond the decimal's native precision.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Reject zero and negative values.
pub fn ensure_positive(value: Decimal, field: &str) -> DomainResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "{field} must be greater than zero (got {value})"
        )));
    }
    Ok(value)
}

/// Reject negative values.
pub fn ensure_non_negative(value: Decimal, field: &str) -> DomainResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "{field} cannot be negative (got {value})"
        )));
    }
    Ok(value)
}

/// `a + b`, or `Validation` when the sum does not fit a decimal.
pub fn checked_add(a: Decimal, b: Decimal, field: &str) -> DomainResult<Decimal> {
    a.checked_add(b).ok_or_else(|| out_of_range(field))
}

/// `a × b`, or `Validation` when the product does not fit a decimal.
pub fn checked_mul(a: Decimal, b: Decimal, field: &str) -> DomainResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| out_of_range(field))
}

/// Sum `values`, failing with `Validation` on overflow.
pub fn checked_sum<I>(values: I, field: &str) -> DomainResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| checked_add(acc, v, field))
}

fn out_of_range(field: &str) -> DomainError {
    DomainError::validation(format!("{field} is out of range"))
}

/// Reject blank strings, returning the trimmed value.
pub fn ensure_present(value: &str, field: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn positive_rejects_zero() {
        assert!(ensure_positive(dec!(0), "quantity").is_err());
        assert_eq!(ensure_positive(dec!(0.5), "quantity").unwrap(), dec!(0.5));
    }

    #[test]
    fn non_negative_accepts_zero() {
        assert!(ensure_non_negative(dec!(0), "quantity").is_ok());
        assert!(ensure_non_negative(dec!(-0.01), "quantity").is_err());
    }

    #[test]
    fn overflow_is_a_validation_error() {
        assert!(matches!(
            checked_add(Decimal::MAX, dec!(1), "quantity"),
            Err(DomainError::Validation(msg)) if msg == "quantity is out of range"
        ));
        assert!(checked_mul(Decimal::MAX, dec!(2), "required").is_err());
        assert!(checked_sum([Decimal::MAX, Decimal::MAX], "total").is_err());
        assert_eq!(checked_sum([dec!(1.5), dec!(2)], "total").unwrap(), dec!(3.5));
        assert_eq!(checked_mul(dec!(300), dec!(20), "required").unwrap(), dec!(6000));
    }

    #[test]
    fn present_trims() {
        assert_eq!(ensure_present("  C25 ", "product code").unwrap(), "C25");
        assert!(matches!(
            ensure_present("   ", "name"),
            Err(DomainError::Validation(msg)) if msg == "name is required"
        ));
    }
}
