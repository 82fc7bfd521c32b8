//! Conversions between stored `NUMERIC` money values and JSON numbers.

use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};

use crate::error::{AppError, AppResult};

/// Exclusive bound of the `NUMERIC(18, 2)` money columns.
const MAX_AMOUNT: f64 = 1e16;

/// Renders a money value as a JSON number.
pub fn to_number(value: &BigDecimal) -> f64 {
    value.round(2).to_f64().unwrap_or_default()
}

/// Parses a client-supplied amount, rounded to cents.
pub fn from_number(field: &str, value: f64) -> AppResult<BigDecimal> {
    if !value.is_finite() {
        return Err(AppError::Validation {
            field: field.to_string(),
            reason: "Amount must be a finite number".to_string(),
        });
    }
    if value.abs() >= MAX_AMOUNT {
        return Err(AppError::Validation {
            field: field.to_string(),
            reason: "Amount is too large".to_string(),
        });
    }
    BigDecimal::from_str(&value.to_string())
        .map(|amount| amount.round(2))
        .map_err(|e| AppError::Validation {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_number_keeps_cents() {
        assert_eq!(from_number("price", 19.99).unwrap(), BigDecimal::from_str("19.99").unwrap());
        assert_eq!(from_number("price", 0.1).unwrap(), BigDecimal::from_str("0.10").unwrap());
    }

    #[test]
    fn test_from_number_rejects_nan() {
        assert!(matches!(
            from_number("price", f64::NAN),
            Err(AppError::Validation { field, .. }) if field == "price"
        ));
    }

    #[test]
    fn test_from_number_rejects_amounts_beyond_column_precision() {
        assert!(from_number("price", 9_999_999_999_999.99).is_ok());
        assert!(matches!(
            from_number("price", 1e16),
            Err(AppError::Validation { field, reason })
                if field == "price" && reason == "Amount is too large"
        ));
        assert!(from_number("price", 1e300).is_err());
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&BigDecimal::from_str("25.50").unwrap()), 25.5);
        assert_eq!(to_number(&BigDecimal::from(3)), 3.0);
    }
}
