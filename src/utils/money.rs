/// Money helpers.
///
/// Amounts are stored as NUMERIC(12,2) and carried as `BigDecimal`; request
/// bodies send plain JSON numbers which are rounded to two decimals here.
use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::{Signed, ToPrimitive, Zero};

/// Converts a request amount into a two-decimal `BigDecimal`.
pub fn to_money(amount: f64) -> Result<BigDecimal, String> {
    if !amount.is_finite() {
        return Err("Amount must be a finite number".to_string());
    }

    let value = BigDecimal::try_from(amount).map_err(|_| "Invalid amount".to_string())?;
    Ok(value.with_scale_round(2, RoundingMode::HalfUp))
}

/// Largest amount a NUMERIC(12,2) column holds, in cents.
const MAX_AMOUNT_CENTS: i64 = 999_999_999_999;

pub fn max_money() -> BigDecimal {
    BigDecimal::from(MAX_AMOUNT_CENTS) / BigDecimal::from(100)
}

/// Like `to_money`, but the rounded amount must be above zero and fit the
/// money columns.
pub fn to_positive_money(amount: f64) -> Result<BigDecimal, String> {
    let value = to_money(amount)?;
    if value.is_zero() || value.is_negative() {
        return Err("Amount must be greater than 0".to_string());
    }
    if value > max_money() {
        return Err(format!("Amount must not exceed {}", max_money()));
    }
    Ok(value)
}

pub fn money_to_f64(amount: &BigDecimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(to_money(500.0).unwrap(), BigDecimal::from(500));
        assert_eq!(to_money(19.999).unwrap(), BigDecimal::from_str("20.00").unwrap());
        assert_eq!(to_money(0.125).unwrap(), BigDecimal::from_str("0.13").unwrap());
    }

    #[test]
    fn positive_amounts_only() {
        assert!(to_positive_money(0.0).is_err());
        assert!(to_positive_money(-5.0).is_err());
        assert!(to_positive_money(0.001).is_err());
        assert_eq!(to_positive_money(0.01).unwrap(), BigDecimal::from_str("0.01").unwrap());
    }

    #[test]
    fn amounts_beyond_column_range_are_rejected() {
        assert_eq!(max_money(), BigDecimal::from_str("9999999999.99").unwrap());
        assert_eq!(
            to_positive_money(9_999_999_999.99).unwrap(),
            BigDecimal::from_str("9999999999.99").unwrap()
        );
        assert!(to_positive_money(1e11).is_err());
        assert!(to_positive_money(9_999_999_999.996).is_err());
    }

    #[test]
    fn non_finite_is_rejected() {
        assert!(to_money(f64::NAN).is_err());
        assert!(to_money(f64::INFINITY).is_err());
    }

    #[test]
    fn converts_back_to_float() {
        assert_eq!(money_to_f64(&BigDecimal::from_str("123.45").unwrap()), 123.45);
    }
}
