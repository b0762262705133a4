//! Decimal helpers shared by every calculation pass.
//!
//! All arithmetic uses `rust_decimal::Decimal`. Monetary outputs are rounded
//! to cents with `RoundingStrategy::MidpointAwayFromZero`; there is no `f64`
//! anywhere in the calculation path.

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Round to two decimal places, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount × percent / 100`, unrounded.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

/// `percent_of` for amounts that were never bounded on input, such as
/// stored results. Returns `None` on overflow.
pub fn checked_percent_of(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(percent)?
        .checked_div(Decimal::ONE_HUNDRED)
}

/// Strip the GST-style markup of `percent` from a gross amount:
/// `amount / (1 + percent/100)`.
///
/// Returns `None` when the divisor would be zero (a -100% rate) or the
/// quotient overflows.
pub fn remove_markup(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    let divisor = Decimal::ONE.checked_add(percent.checked_div(Decimal::ONE_HUNDRED)?)?;
    amount.checked_div(divisor)
}

/// Keep a percentage only when it is strictly positive.
pub fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| *v > Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec("0.125")), dec("0.13"));
        assert_eq!(round2(dec("-0.125")), dec("-0.13"));
        assert_eq!(round2(dec("2.675")), dec("2.68"));
        assert_eq!(round2(dec("1.004")), dec("1.00"));
    }

    #[test]
    fn test_round2_is_idempotent() {
        for s in ["0.125", "-7.775", "9.0909", "100", "0.005"] {
            let once = round2(dec(s));
            assert_eq!(round2(once), once, "round2 not idempotent for {}", s);
        }
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec("500"), dec("40")), dec("200"));
        assert_eq!(percent_of(dec("55"), dec("10")), dec("5.5"));
    }

    #[test]
    fn test_checked_percent_of() {
        assert_eq!(checked_percent_of(dec("55"), dec("10")), Some(dec("5.5")));
        assert_eq!(checked_percent_of(Decimal::MAX, dec("200")), None);
    }

    #[test]
    fn test_remove_markup() {
        assert_eq!(remove_markup(dec("110"), dec("10")), Some(dec("100")));
        assert_eq!(remove_markup(dec("110"), dec("-100")), None);
        assert_eq!(remove_markup(Decimal::MAX, dec("-99.9999999999")), None);
    }

    #[test]
    fn test_positive_filters_zero_and_negative() {
        assert_eq!(positive(Some(dec("5"))), Some(dec("5")));
        assert_eq!(positive(Some(Decimal::ZERO)), None);
        assert_eq!(positive(Some(dec("-1"))), None);
        assert_eq!(positive(None), None);
    }
}
