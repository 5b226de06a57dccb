use rust_decimal::Decimal;

use crate::constants::DISPLAY_DECIMAL_PRECISION;

/// `part / total * 100` rounded for display; zero when `total` is not positive.
pub fn percentage_of(part: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (part / total * Decimal::ONE_HUNDRED).round_dp(DISPLAY_DECIMAL_PRECISION)
}

/// `part / total` at full precision; zero when `total` is zero.
pub fn ratio_of(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    part / total
}
