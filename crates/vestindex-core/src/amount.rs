//! Decimal rendering of base-unit token amounts.
//!
//! Output matches the familiar `formatEther` shape: the integer part, a dot,
//! and the fractional digits with trailing zeros removed (at least one digit
//! is kept, so one whole token renders as `"1.0"`).

use alloy_primitives::{I256, U256};

/// Render an unsigned base-unit amount with `decimals` fractional digits.
pub fn format_units(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let base = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / base;
    let frac = value % base;

    let mut frac_digits = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    while frac_digits.len() > 1 && frac_digits.ends_with('0') {
        frac_digits.pop();
    }
    format!("{whole}.{frac_digits}")
}

/// Render a signed balance; negative values get a leading `-`.
pub fn format_signed_units(value: I256, decimals: u8) -> String {
    let magnitude = format_units(value.unsigned_abs(), decimals);
    if value.is_negative() {
        format!("-{magnitude}")
    } else {
        magnitude
    }
}

/// `whole * 10^decimals`, saturating.
pub fn parse_whole_units(whole: u64, decimals: u8) -> U256 {
    U256::from(whole).saturating_mul(U256::from(10u64).pow(U256::from(decimals)))
}

/// Convert an unsigned amount into the signed balance domain, saturating at
/// `I256::MAX` for values that do not fit.
pub fn to_signed(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}
